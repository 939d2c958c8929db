//! Small host used by the unit tests of this crate.

use quill_core::{HostModule, MethodSpec, NumericKind, TypeId, TypeKind, TypeTable};
use quill_runtime::ScriptRuntime;

pub(crate) struct TestHost {
    pub runtime: ScriptRuntime,
    pub colony: TypeId,
    pub list_of_colony: TypeId,
}

pub(crate) fn test_host() -> TestHost {
    let mut types = TypeTable::new();
    let wk = types.well_known().clone();
    let int = wk.numeric(NumericKind::Int32);
    let double = wk.numeric(NumericKind::Double);

    let math = types.define("System", "Math", TypeKind::Class).unwrap();
    types
        .add_method(math, MethodSpec::new("Max", vec![int, int], int).with_static())
        .unwrap();
    types
        .add_method(math, MethodSpec::new("Max", vec![double, double], double).with_static())
        .unwrap();
    types.add_property(math, "PI", double, true).unwrap();

    let enumerable = types
        .define_generic("System.Collections.Generic", "IEnumerable", TypeKind::Interface, &["T"])
        .unwrap();
    let element = types.generic_parameters(enumerable)[0];
    let list = types
        .define_generic("System.Collections.Generic", "List", TypeKind::Class, &["T"])
        .unwrap();
    let list_element = types.generic_parameters(list)[0];
    let enumerable_of_element = types.instantiate(enumerable, &[list_element]).unwrap();
    types.add_interface(list, enumerable_of_element).unwrap();
    types.add_property(list, "Count", int, false).unwrap();
    types
        .add_method(list, MethodSpec::new("get_Item", vec![int], list_element))
        .unwrap();

    let linq = types.define("System.Linq", "Enumerable", TypeKind::Class).unwrap();
    types
        .add_method(linq, MethodSpec::new("Count", vec![enumerable], int).with_extension())
        .unwrap();
    types
        .add_method(linq, MethodSpec::new("First", vec![enumerable], element).with_extension())
        .unwrap();

    let populated = types
        .define("Supremacy.Game", "IPopulated", TypeKind::Interface)
        .unwrap();
    types.add_property(populated, "Population", int, false).unwrap();
    let civilization = types
        .define("Supremacy.Game", "Civilization", TypeKind::Class)
        .unwrap();
    types
        .add_property(civilization, "Name", wk.string, false)
        .unwrap();
    let colony = types.define("Supremacy.Game", "Colony", TypeKind::Class).unwrap();
    types.add_interface(colony, populated).unwrap();
    let morale = types.extensible_of(int).unwrap();
    types.add_property(colony, "Name", wk.string, false).unwrap();
    types.add_property(colony, "Morale", morale, false).unwrap();
    types.add_property(colony, "Owner", civilization, false).unwrap();
    types.add_property(colony, "Tag", wk.object, false).unwrap();
    types
        .add_method(colony, MethodSpec::new("Produce", vec![double], double))
        .unwrap();
    let colony_ext = types
        .define("Supremacy.Game", "ColonyExtensions", TypeKind::Class)
        .unwrap();
    types
        .add_method(
            colony_ext,
            MethodSpec::new("GrowthRate", vec![populated], double).with_extension(),
        )
        .unwrap();
    types.define("Supremacy.Game", "Sector", TypeKind::Class).unwrap();
    types.define("Supremacy.Universe", "Sector", TypeKind::Class).unwrap();

    let list_of_colony = types.instantiate(list, &[colony]).unwrap();
    types.instantiate(list, &[int]).unwrap();
    types.nullable_of(int).unwrap();

    let runtime = ScriptRuntime::new(types);
    runtime
        .load_module(
            &HostModule::new("system")
                .with_types([linq])
                .with_visible_namespace("System")
                .with_visible_namespace("System.Linq"),
        )
        .unwrap();
    runtime
        .load_module(
            &HostModule::new("game")
                .with_types([colony_ext])
                .with_alias("Game", "Supremacy.Game"),
        )
        .unwrap();
    TestHost {
        runtime,
        colony,
        list_of_colony,
    }
}
