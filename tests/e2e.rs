//! End-to-end compilation of scripts against the standard host.

use insta::assert_snapshot;
use quill::standard_runtime;
use quill_core::diagnostic::codes;
use quill_front::{CompileOptions, CompileOutput, ParameterSpec, compile};
use quill_runtime::ScriptRuntime;

fn colony_options() -> CompileOptions {
    CompileOptions {
        parameters: vec![ParameterSpec {
            name: "colony".into(),
            type_name: "Supremacy.Game.Colony".into(),
        }],
        ..CompileOptions::default()
    }
}

fn render(runtime: &ScriptRuntime, output: &CompileOutput) -> String {
    let mut text = match &output.expr {
        Some(expr) => expr.display(runtime.types()).to_string(),
        None => "<no tree>".to_owned(),
    };
    for diagnostic in &output.diagnostics {
        text.push('\n');
        text.push_str(&diagnostic.to_string());
    }
    text
}

#[test]
fn test_ambiguous_simple_name() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &CompileOptions::default(),
        "using Supremacy.Game;\nusing Supremacy.Universe;\nSector",
    );
    assert!(output.has_errors());
    assert_snapshot!(
        render(&runtime, &output),
        @r"
    error : System.Object
    ERROR QS0104 at 48..54: 'Sector' is an ambiguous reference between 'Supremacy.Game.Sector' and 'Supremacy.Universe.Sector'.
    "
    );
}

#[test]
fn test_qualified_name_resolves_ambiguity() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &colony_options(),
        "using Supremacy.Game;\nusing Supremacy.Universe;\ncolony.Location as Supremacy.Universe.Sector",
    );
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
}

#[test]
fn test_interface_extension_method() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &colony_options(),
        "using Supremacy.Game;\ncolony.GrowthRate() * 2",
    );
    assert_snapshot!(render(&runtime, &output), @r"
    binary * : System.Double
      extension-call Supremacy.Game.ColonyExtensions.GrowthRate(Supremacy.Game.IPopulated) : System.Double
        convert Assignable [ImplicitCast] : Supremacy.Game.IPopulated
          parameter colony : Supremacy.Game.Colony
      convert NumericWiden(Int32 -> Double) [ImplicitCast] : System.Double
        literal 2 : System.Int32
    ");
}

#[test]
fn test_extension_needs_import() {
    let runtime = standard_runtime().unwrap();
    let output = compile(&runtime, &colony_options(), "colony.GrowthRate()");
    let found: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(found, vec![codes::MEMBER_NOT_FOUND]);
}

#[test]
fn test_user_defined_conversions() {
    let runtime = standard_runtime().unwrap();
    let options = CompileOptions {
        result_type: Some("System.Decimal".into()),
        ..colony_options()
    };
    let output = compile(&runtime, &options, "colony.Owner.Credits");
    assert_snapshot!(render(&runtime, &output), @r"
    convert UserDefined(Supremacy.Game.Credits.op_Implicit(Supremacy.Game.Credits), implicit) [ImplicitCast] : System.Decimal
      property Supremacy.Game.Civilization.Credits : Supremacy.Game.Credits
        property Supremacy.Game.Colony.Owner : Supremacy.Game.Civilization
          parameter colony : Supremacy.Game.Colony
    ");

    let output = compile(&runtime, &colony_options(), "(Int32)colony.Owner.Credits");
    assert!(!output.has_errors(), "{:?}", output.diagnostics);

    // op_Explicit is never used implicitly.
    let options = CompileOptions {
        result_type: Some("System.Int32".into()),
        ..colony_options()
    };
    let output = compile(&runtime, &options, "colony.Owner.Credits");
    let found: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(found, vec![codes::CANNOT_CONVERT_IMPLICITLY]);
}

#[test]
fn test_extensible_property_arithmetic() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &colony_options(),
        "colony.Morale + colony.Growth > 10",
    );
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
    assert_eq!(
        runtime.types().display_name(output.expr.unwrap().ty),
        "System.Boolean"
    );
}

#[test]
fn test_collections_and_linq() {
    let runtime = standard_runtime().unwrap();
    let options = CompileOptions {
        parameters: vec![ParameterSpec {
            name: "colonies".into(),
            type_name: "System.Collections.Generic.List<Supremacy.Game.Colony>".into(),
        }],
        ..CompileOptions::default()
    };
    let output = compile(
        &runtime,
        &options,
        "colonies.Any() && colonies.First().Owner.Name == colonies[1].Owner.Name",
    );
    assert!(!output.has_errors(), "{:?}", output.diagnostics);
}

#[test]
fn test_checked_scopes_nest() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &CompileOptions::default(),
        "checked(1 + unchecked(2 * 3) - 4)",
    );
    assert_snapshot!(render(&runtime, &output), @r"
    binary - checked : System.Int32
      binary + checked : System.Int32
        literal 1 : System.Int32
        binary * : System.Int32
          literal 2 : System.Int32
          literal 3 : System.Int32
      literal 4 : System.Int32
    ");
}

#[test]
fn test_nullable_conversions() {
    let runtime = standard_runtime().unwrap();
    let output = compile(
        &runtime,
        &colony_options(),
        "(Int32?)colony.Morale == null",
    );
    assert!(!output.has_errors(), "{:?}", output.diagnostics);

    let output = compile(&runtime, &colony_options(), "(Int32?)colony.Name");
    let found: Vec<u32> = output.diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(found, vec![codes::CANNOT_CONVERT]);
}
