//! The standard host library.
//!
//! Scripts compiled by the `quill` CLI run against this host: the `System`
//! types every script can name, the generic collections with their LINQ
//! style extension methods, and the game model under `Supremacy.*`.
//!
//! Script-visible namespaces are `System`, `System.Collections.Generic` and
//! `System.Linq`. The game namespaces must be imported with `using`, or
//! reached through the `Game` alias. Both `Supremacy.Game` and
//! `Supremacy.Universe` define a `Sector`, so importing both makes the
//! simple name ambiguous.

use derive_more::{Display, Error, From};
use quill_core::{HostModule, MethodSpec, NumericKind, TypeError, TypeId, TypeKind, TypeTable};
use quill_runtime::{RegistryError, ScriptRuntime};
use tracing::debug;

pub const SYSTEM_MODULE: &str = "system";
pub const GAME_MODULE: &str = "game";

/// Failure to assemble the standard host.
#[derive(Debug, Display, Error, From)]
pub enum HostError {
    #[display("invalid host metadata: {_0}")]
    Metadata(TypeError),

    #[display("failed to load host module: {_0}")]
    Module(RegistryError),
}

/// Build the runtime with the standard library and the game module loaded.
pub fn standard_runtime() -> Result<ScriptRuntime, HostError> {
    let mut types = TypeTable::new();
    let system = define_system(&mut types)?;
    let game = define_game(&mut types, &system)?;

    let runtime = ScriptRuntime::new(types);
    let loaded = runtime.load_module(
        &HostModule::new(SYSTEM_MODULE)
            .with_types([system.math, system.enumerable_ext])
            .with_visible_namespace("System")
            .with_visible_namespace("System.Collections.Generic")
            .with_visible_namespace("System.Linq"),
    )?;
    debug!(module = SYSTEM_MODULE, ?loaded, "standard module ready");
    let loaded = runtime.load_module(
        &HostModule::new(GAME_MODULE)
            .with_types([game.colony_ext])
            .with_alias("Game", "Supremacy.Game"),
    )?;
    debug!(module = GAME_MODULE, ?loaded, "standard module ready");
    Ok(runtime)
}

struct SystemTypes {
    math: TypeId,
    list: TypeId,
    enumerable_ext: TypeId,
}

fn define_system(types: &mut TypeTable) -> Result<SystemTypes, TypeError> {
    let wk = types.well_known().clone();
    let int = wk.numeric(NumericKind::Int32);
    let double = wk.numeric(NumericKind::Double);

    let comparable = types.define("System", "IComparable", TypeKind::Interface)?;
    types.add_method(comparable, MethodSpec::new("CompareTo", vec![wk.object], int))?;

    let math = types.define("System", "Math", TypeKind::Class)?;
    for name in ["Max", "Min"] {
        for ty in [int, double] {
            types.add_method(math, MethodSpec::new(name, vec![ty, ty], ty).with_static())?;
        }
    }
    for ty in [int, double] {
        types.add_method(math, MethodSpec::new("Abs", vec![ty], ty).with_static())?;
    }
    types.add_method(math, MethodSpec::new("Round", vec![double], double).with_static())?;
    types.add_property(math, "PI", double, true)?;
    types.add_property(math, "E", double, true)?;

    let enumerable = types.define_generic(
        "System.Collections.Generic",
        "IEnumerable",
        TypeKind::Interface,
        &["T"],
    )?;
    let list = types.define_generic("System.Collections.Generic", "List", TypeKind::Class, &["T"])?;
    let item = types.generic_parameters(list)[0];
    let enumerable_of_item = types.instantiate(enumerable, &[item])?;
    types.add_interface(list, enumerable_of_item)?;
    types.add_property(list, "Count", int, false)?;
    types.add_method(list, MethodSpec::new("get_Item", vec![int], item))?;
    types.add_method(list, MethodSpec::new("Contains", vec![item], wk.boolean))?;

    let element = types.generic_parameters(enumerable)[0];
    let enumerable_ext = types.define("System.Linq", "Enumerable", TypeKind::Class)?;
    types.add_method(
        enumerable_ext,
        MethodSpec::new("Count", vec![enumerable], int).with_extension(),
    )?;
    types.add_method(
        enumerable_ext,
        MethodSpec::new("Any", vec![enumerable], wk.boolean).with_extension(),
    )?;
    types.add_method(
        enumerable_ext,
        MethodSpec::new("First", vec![enumerable], element).with_extension(),
    )?;

    for numeric in [int, double] {
        types.instantiate(list, &[numeric])?;
        types.nullable_of(numeric)?;
    }
    types.extensible_of(int)?;
    types.extensible_of(double)?;

    Ok(SystemTypes {
        math,
        list,
        enumerable_ext,
    })
}

struct GameTypes {
    colony_ext: TypeId,
}

fn define_game(types: &mut TypeTable, system: &SystemTypes) -> Result<GameTypes, TypeError> {
    let wk = types.well_known().clone();
    let int = wk.numeric(NumericKind::Int32);
    let double = wk.numeric(NumericKind::Double);
    let decimal = wk.numeric(NumericKind::Decimal);

    // `Credits` converts implicitly to Decimal and only explicitly to Int32.
    let credits = types.define("Supremacy.Game", "Credits", TypeKind::Struct)?;
    types.add_property(credits, "CurrentValue", int, false)?;
    types.add_method(
        credits,
        MethodSpec::new("op_Implicit", vec![credits], decimal).with_static(),
    )?;
    types.add_method(
        credits,
        MethodSpec::new("op_Explicit", vec![credits], int)
            .with_static()
            .with_explicit_only(),
    )?;

    let populated = types.define("Supremacy.Game", "IPopulated", TypeKind::Interface)?;
    types.add_property(populated, "Population", int, false)?;

    let civilization = types.define("Supremacy.Game", "Civilization", TypeKind::Class)?;
    types.add_property(civilization, "Name", wk.string, false)?;
    types.add_property(civilization, "Credits", credits, false)?;

    let game_sector = types.define("Supremacy.Game", "Sector", TypeKind::Class)?;
    types.add_property(game_sector, "Name", wk.string, false)?;
    let map_sector = types.define("Supremacy.Universe", "Sector", TypeKind::Class)?;
    types.add_property(map_sector, "X", int, false)?;
    types.add_property(map_sector, "Y", int, false)?;

    let colony = types.define("Supremacy.Game", "Colony", TypeKind::Class)?;
    types.add_interface(colony, populated)?;
    let morale = types.extensible_of(int)?;
    let growth = types.extensible_of(double)?;
    types.add_property(colony, "Name", wk.string, false)?;
    types.add_property(colony, "Morale", morale, false)?;
    types.add_property(colony, "Growth", growth, false)?;
    types.add_property(colony, "Owner", civilization, false)?;
    types.add_property(colony, "Sector", game_sector, false)?;
    types.add_property(colony, "Location", map_sector, false)?;
    types.add_property(colony, "Tag", wk.object, false)?;
    types.add_method(colony, MethodSpec::new("Produce", vec![double], double))?;

    let colony_ext = types.define("Supremacy.Game", "ColonyExtensions", TypeKind::Class)?;
    types.add_method(
        colony_ext,
        MethodSpec::new("GrowthRate", vec![populated], double).with_extension(),
    )?;
    types.add_method(
        colony_ext,
        MethodSpec::new("IsOwnedBy", vec![colony, civilization], wk.boolean).with_extension(),
    )?;

    types.instantiate(system.list, &[colony])?;
    types.instantiate(system.list, &[civilization])?;

    Ok(GameTypes { colony_ext })
}
