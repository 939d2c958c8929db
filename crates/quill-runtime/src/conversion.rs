//! Conversion resolution.
//!
//! [`ConversionResolver::resolve`] decides how a value of static type `S`
//! becomes a value of type `T`. Rules are tried in a fixed order and the
//! first one that applies wins:
//!
//! 1. identity
//! 2. boxing a value type into `Object`
//! 3. assignability (reference widening, interface implementation)
//! 4. unwrapping `Extensible<U>` into `U`
//! 5. user-defined conversion methods (`op_Implicit`, `ConvertTo<Name>`,
//!    and in explicit modes `op_Explicit`)
//! 6. implicit numeric widening
//! 7. wrapping into `Nullable<T0>`
//! 8. `null` to a reference type
//! 9. explicit-only casts (numeric narrowing, downcast, unboxing), then
//!    failure
//!
//! The resolver never reports errors itself. A [`ConversionPlan::Failure`]
//! under a cast mode is turned into a diagnostic by the caller; under a try
//! mode it is lowered to a sentinel value.

use std::fmt;

use derive_more::Display;
use quill_core::{MethodId, NumericKind, TypeId, TypeTable};
use tracing::trace;

use crate::member_cache::MemberCache;
use crate::numeric;

pub const IMPLICIT_OPERATOR: &str = "op_Implicit";
pub const EXPLICIT_OPERATOR: &str = "op_Explicit";

/// Strictness and failure behavior of a conversion.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversionMode {
    ImplicitCast,
    ImplicitTry,
    ExplicitCast,
    ExplicitTry,
}

impl ConversionMode {
    pub const ALL: [ConversionMode; 4] = [
        ConversionMode::ImplicitCast,
        ConversionMode::ImplicitTry,
        ConversionMode::ExplicitCast,
        ConversionMode::ExplicitTry,
    ];

    /// Whether explicit conversions may be used.
    pub const fn is_explicit(self) -> bool {
        matches!(
            self,
            ConversionMode::ExplicitCast | ConversionMode::ExplicitTry
        )
    }

    /// Whether failure yields a sentinel instead of an error.
    pub const fn is_try(self) -> bool {
        matches!(self, ConversionMode::ImplicitTry | ConversionMode::ExplicitTry)
    }
}

/// Caller-facing strictness tier used by overload resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NarrowingLevel {
    None,
    One,
    Two,
    Three,
    #[default]
    All,
}

impl NarrowingLevel {
    /// `None` for [`NarrowingLevel::None`], which only allows assignability.
    pub const fn conversion_mode(self) -> Option<ConversionMode> {
        match self {
            NarrowingLevel::None => None,
            NarrowingLevel::One => Some(ConversionMode::ImplicitCast),
            NarrowingLevel::Two => Some(ConversionMode::ImplicitTry),
            NarrowingLevel::Three => Some(ConversionMode::ExplicitCast),
            NarrowingLevel::All => Some(ConversionMode::ExplicitTry),
        }
    }
}

/// Which of two conversion targets overload resolution should prefer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Candidate {
    One,
    Two,
    Equivalent,
    Ambiguous,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NullableWrapKind {
    /// `null` becomes the empty nullable.
    Empty,
    /// The source already is the underlying type.
    Wrap,
    /// Explicit modes: convert to the underlying type, then wrap.
    ConvertThenWrap(Box<ConversionPlan>),
}

/// Resolved outcome of one conversion attempt.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConversionPlan {
    Identity,
    Box,
    Assignable,
    /// Read `Extensible<U>.Value`, then apply the inner plan to `U`.
    UnwrapExtensible(Box<ConversionPlan>),
    UserDefined {
        method: MethodId,
        is_implicit: bool,
    },
    NumericWiden {
        from: NumericKind,
        to: NumericKind,
    },
    NullableWrap(NullableWrapKind),
    NullToReference,
    NumericNarrow {
        from: NumericKind,
        to: NumericKind,
    },
    /// Checked reference conversion to a derived type or implementing class.
    Downcast,
    Unbox,
    Failure(ConversionMode),
}

impl ConversionPlan {
    pub fn is_failure(&self) -> bool {
        matches!(self, ConversionPlan::Failure(_))
    }

    /// Short name of the rule that produced the plan.
    pub fn rule_name(&self) -> &'static str {
        match self {
            ConversionPlan::Identity => "identity",
            ConversionPlan::Box => "box",
            ConversionPlan::Assignable => "assignable",
            ConversionPlan::UnwrapExtensible(_) => "unwrap-extensible",
            ConversionPlan::UserDefined { .. } => "user-defined",
            ConversionPlan::NumericWiden { .. } => "numeric-widen",
            ConversionPlan::NullableWrap(_) => "nullable-wrap",
            ConversionPlan::NullToReference => "null-to-reference",
            ConversionPlan::NumericNarrow { .. } => "numeric-narrow",
            ConversionPlan::Downcast => "downcast",
            ConversionPlan::Unbox => "unbox",
            ConversionPlan::Failure(_) => "failure",
        }
    }

    /// Human readable form; method references need the type table.
    pub fn display<'a>(&'a self, types: &'a TypeTable) -> PlanDisplay<'a> {
        PlanDisplay { plan: self, types }
    }
}

pub struct PlanDisplay<'a> {
    plan: &'a ConversionPlan,
    types: &'a TypeTable,
}

impl fmt::Display for PlanDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.plan {
            ConversionPlan::Identity => f.write_str("Identity"),
            ConversionPlan::Box => f.write_str("Box"),
            ConversionPlan::Assignable => f.write_str("Assignable"),
            ConversionPlan::UnwrapExtensible(inner) => {
                write!(f, "UnwrapExtensible({})", inner.display(self.types))
            }
            ConversionPlan::UserDefined {
                method,
                is_implicit,
            } => write!(
                f,
                "UserDefined({}, {})",
                self.types.method_signature(*method),
                if *is_implicit { "implicit" } else { "explicit" }
            ),
            ConversionPlan::NumericWiden { from, to } => {
                write!(f, "NumericWiden({} -> {})", from.name(), to.name())
            }
            ConversionPlan::NullableWrap(kind) => match kind {
                NullableWrapKind::Empty => f.write_str("NullableWrap(empty)"),
                NullableWrapKind::Wrap => f.write_str("NullableWrap(wrap)"),
                NullableWrapKind::ConvertThenWrap(inner) => {
                    write!(f, "NullableWrap({})", inner.display(self.types))
                }
            },
            ConversionPlan::NullToReference => f.write_str("NullToReference"),
            ConversionPlan::NumericNarrow { from, to } => {
                write!(f, "NumericNarrow({} -> {})", from.name(), to.name())
            }
            ConversionPlan::Downcast => f.write_str("Downcast"),
            ConversionPlan::Unbox => f.write_str("Unbox"),
            ConversionPlan::Failure(mode) => write!(f, "Failure({mode})"),
        }
    }
}

/// A resolved conversion together with the static type the converted
/// expression ends up with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversion {
    pub source: TypeId,
    pub target: TypeId,
    pub mode: ConversionMode,
    pub plan: ConversionPlan,
    /// `Object` for try modes converting to a value type, so that success
    /// and the boxed sentinel share one type. `target` otherwise.
    pub result_type: TypeId,
}

impl Conversion {
    pub fn is_success(&self) -> bool {
        !self.plan.is_failure()
    }

    /// Failure under a cast mode: the caller must report it.
    pub fn is_error(&self) -> bool {
        self.plan.is_failure() && !self.mode.is_try()
    }

    pub fn render(&self, types: &TypeTable) -> String {
        format!(
            "{} -> {} [{}]: {}",
            types.display_name(self.source),
            types.display_name(self.target),
            self.mode,
            self.plan.display(types)
        )
    }
}

/// Ordered conversion rules over host metadata.
#[derive(Clone, Copy)]
pub struct ConversionResolver<'a> {
    types: &'a TypeTable,
    members: &'a MemberCache,
}

impl<'a> ConversionResolver<'a> {
    pub fn new(types: &'a TypeTable, members: &'a MemberCache) -> Self {
        Self { types, members }
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    pub fn resolve(&self, source: TypeId, target: TypeId, mode: ConversionMode) -> Conversion {
        let plan = self.select_plan(source, target, mode);
        let result_type = if mode.is_try() && self.types.is_value_type(target) {
            self.types.well_known().object
        } else {
            target
        };
        trace!(
            source = %self.types.display_name(source),
            target = %self.types.display_name(target),
            mode = %mode,
            rule = plan.rule_name(),
            "resolved conversion"
        );
        Conversion {
            source,
            target,
            mode,
            plan,
            result_type,
        }
    }

    /// Overload resolution query. `to_not_nullable` does not affect the answer.
    pub fn can_convert(
        &self,
        from: TypeId,
        to: TypeId,
        _to_not_nullable: bool,
        level: NarrowingLevel,
    ) -> bool {
        match level.conversion_mode() {
            None => self.types.is_assignable_from(to, from),
            Some(mode) => !self.select_plan(from, to, mode).is_failure(),
        }
    }

    /// Scripts never prefer one conversion target over another.
    pub fn prefer_convert(&self, _t1: TypeId, _t2: TypeId) -> Candidate {
        Candidate::Ambiguous
    }

    fn select_plan(&self, source: TypeId, target: TypeId, mode: ConversionMode) -> ConversionPlan {
        let types = self.types;
        let wk = types.well_known();

        if source == target {
            return ConversionPlan::Identity;
        }
        if target == wk.object && types.is_value_type(source) {
            return ConversionPlan::Box;
        }
        if types.is_assignable_from(target, source) {
            return ConversionPlan::Assignable;
        }
        if let Some(plan) = self.try_extensible(source, target) {
            return plan;
        }
        if let Some(plan) = self.try_user_defined(source, target, mode) {
            return plan;
        }
        if let Some(plan) = self.numeric_widening(source, target) {
            return plan;
        }
        if let Some(plan) = self.try_nullable(source, target, mode) {
            return plan;
        }
        if source == wk.null && types.is_reference_type(target) {
            return ConversionPlan::NullToReference;
        }
        if mode.is_explicit()
            && let Some(plan) = self.try_explicit(source, target, mode)
        {
            return plan;
        }
        ConversionPlan::Failure(mode)
    }

    fn try_extensible(&self, source: TypeId, target: TypeId) -> Option<ConversionPlan> {
        let underlying = self.types.extensible_underlying(source)?;
        let inner = if underlying == target {
            ConversionPlan::Identity
        } else if self.types.is_assignable_from(target, underlying) {
            ConversionPlan::Assignable
        } else {
            self.numeric_widening(underlying, target)?
        };
        Some(ConversionPlan::UnwrapExtensible(Box::new(inner)))
    }

    /// User-defined operators. The chosen one is bound statically and its
    /// failures are never caught: a throwing `op_Explicit` propagates under
    /// `ExplicitTry` too (see "Open question decisions" in DESIGN.md).
    fn try_user_defined(
        &self,
        source: TypeId,
        target: TypeId,
        mode: ConversionMode,
    ) -> Option<ConversionPlan> {
        let unwrapped = self.types.extensible_underlying(source);
        let from = unwrapped.unwrap_or(source);
        let convert_to = format!("ConvertTo{}", self.types.get(target).name);

        let mut searches = vec![(IMPLICIT_OPERATOR, true), (convert_to.as_str(), true)];
        if mode.is_explicit() {
            searches.push((EXPLICIT_OPERATOR, false));
            searches.push((convert_to.as_str(), false));
        }

        let plan = searches.into_iter().find_map(|(name, is_implicit)| {
            [from, target]
                .into_iter()
                .find_map(|owner| self.conversion_method(owner, name, is_implicit, from, target))
                .map(|method| ConversionPlan::UserDefined {
                    method,
                    is_implicit,
                })
        })?;

        Some(match unwrapped {
            Some(_) => ConversionPlan::UnwrapExtensible(Box::new(plan)),
            None => plan,
        })
    }

    /// A public static `owner.name(P) -> target` where `P` accepts `from`.
    fn conversion_method(
        &self,
        owner: TypeId,
        name: &str,
        is_implicit: bool,
        from: TypeId,
        target: TypeId,
    ) -> Option<MethodId> {
        self.members
            .lookup(self.types, owner, name)
            .into_iter()
            .find(|&id| {
                let method = self.types.method(id);
                method.is_public
                    && method.is_static
                    && !(is_implicit && method.explicit_only)
                    && method.return_type == target
                    && method.parameters.len() == 1
                    && self.types.is_assignable_from(method.parameters[0], from)
            })
    }

    fn numeric_widening(&self, source: TypeId, target: TypeId) -> Option<ConversionPlan> {
        let from = self.types.numeric_kind(source)?;
        let to = self.types.numeric_kind(target)?;
        numeric::is_implicitly_convertible(from, to).then_some(ConversionPlan::NumericWiden { from, to })
    }

    fn try_nullable(
        &self,
        source: TypeId,
        target: TypeId,
        mode: ConversionMode,
    ) -> Option<ConversionPlan> {
        let underlying = self.types.nullable_underlying(target)?;
        let wk = self.types.well_known();
        if source == wk.null {
            return Some(ConversionPlan::NullableWrap(NullableWrapKind::Empty));
        }
        if source == underlying {
            return Some(ConversionPlan::NullableWrap(NullableWrapKind::Wrap));
        }
        if mode.is_explicit() && source != wk.object {
            let inner = self.select_plan(source, underlying, mode);
            if inner.is_failure() {
                return Some(ConversionPlan::Failure(mode));
            }
            return Some(ConversionPlan::NullableWrap(
                NullableWrapKind::ConvertThenWrap(Box::new(inner)),
            ));
        }
        None
    }

    /// Forced casts. Numeric narrowing is a `(T)x` cast only; under
    /// `ExplicitTry` it falls through to the sentinel.
    fn try_explicit(
        &self,
        source: TypeId,
        target: TypeId,
        mode: ConversionMode,
    ) -> Option<ConversionPlan> {
        let types = self.types;
        if let (Some(from), Some(to)) = (types.numeric_kind(source), types.numeric_kind(target)) {
            return (mode == ConversionMode::ExplicitCast)
                .then_some(ConversionPlan::NumericNarrow { from, to });
        }
        if types.is_assignable_from(source, target) {
            return Some(if types.is_value_type(target) {
                ConversionPlan::Unbox
            } else {
                ConversionPlan::Downcast
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use quill_core::{MethodSpec, TypeKind};

    struct Fixture {
        types: TypeTable,
        members: MemberCache,
        planet: TypeId,
        colony: TypeId,
        credits: TypeId,
    }

    impl Fixture {
        fn new() -> Self {
            let mut types = TypeTable::new();
            let wk = types.well_known().clone();
            let int = wk.numeric(NumericKind::Int32);

            let planet = types.define("Game", "Planet", TypeKind::Class).unwrap();
            let colony = types.define("Game", "Colony", TypeKind::Class).unwrap();
            types.set_base(colony, planet).unwrap();
            types
                .add_method(
                    planet,
                    MethodSpec::new(IMPLICIT_OPERATOR, vec![planet], wk.string).with_static(),
                )
                .unwrap();

            let credits = types.define("Game", "Credits", TypeKind::Struct).unwrap();
            types
                .add_method(
                    credits,
                    MethodSpec::new(IMPLICIT_OPERATOR, vec![int], credits).with_static(),
                )
                .unwrap();
            types
                .add_method(
                    credits,
                    MethodSpec::new(EXPLICIT_OPERATOR, vec![credits], int).with_static(),
                )
                .unwrap();
            types
                .add_method(
                    credits,
                    MethodSpec::new("ConvertToString", vec![credits], wk.string)
                        .with_static()
                        .with_explicit_only(),
                )
                .unwrap();

            types.nullable_of(int).unwrap();
            types
                .nullable_of(wk.numeric(NumericKind::Int64))
                .unwrap();
            types.extensible_of(int).unwrap();

            Self {
                types,
                members: MemberCache::new(),
                planet,
                colony,
                credits,
            }
        }

        fn resolver(&self) -> ConversionResolver<'_> {
            ConversionResolver::new(&self.types, &self.members)
        }

        fn numeric(&self, kind: NumericKind) -> TypeId {
            self.types.well_known().numeric(kind)
        }

        fn nullable(&self, kind: NumericKind) -> TypeId {
            self.types
                .find_instance(self.types.well_known().nullable, &[self.numeric(kind)])
                .unwrap()
        }

        fn plan(&self, source: TypeId, target: TypeId, mode: ConversionMode) -> ConversionPlan {
            self.resolver().resolve(source, target, mode).plan
        }
    }

    #[test]
    fn test_narrowing_level_mapping() {
        assert_eq!(NarrowingLevel::None.conversion_mode(), None);
        assert_eq!(
            NarrowingLevel::One.conversion_mode(),
            Some(ConversionMode::ImplicitCast)
        );
        assert_eq!(
            NarrowingLevel::Two.conversion_mode(),
            Some(ConversionMode::ImplicitTry)
        );
        assert_eq!(
            NarrowingLevel::Three.conversion_mode(),
            Some(ConversionMode::ExplicitCast)
        );
        assert_eq!(
            NarrowingLevel::default().conversion_mode(),
            Some(ConversionMode::ExplicitTry)
        );
    }

    #[test]
    fn test_numeric_conversions_follow_widening_table() {
        let fx = Fixture::new();
        for from in NumericKind::ALL {
            for to in NumericKind::ALL {
                let conversion =
                    fx.resolver()
                        .resolve(fx.numeric(from), fx.numeric(to), ConversionMode::ImplicitCast);
                assert_eq!(
                    conversion.is_success(),
                    numeric::is_implicitly_convertible(from, to),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_double_to_int_requires_explicit_mode() {
        let fx = Fixture::new();
        let double = fx.numeric(NumericKind::Double);
        let int = fx.numeric(NumericKind::Int32);

        assert_eq!(
            fx.plan(int, double, ConversionMode::ImplicitCast),
            ConversionPlan::NumericWiden {
                from: NumericKind::Int32,
                to: NumericKind::Double
            }
        );
        assert!(fx.plan(double, int, ConversionMode::ImplicitCast).is_failure());
        assert!(fx.plan(double, int, ConversionMode::ImplicitTry).is_failure());
        assert_eq!(
            fx.plan(double, int, ConversionMode::ExplicitCast),
            ConversionPlan::NumericNarrow {
                from: NumericKind::Double,
                to: NumericKind::Int32
            }
        );
    }

    #[test]
    fn test_numeric_narrowing_is_cast_only() {
        let fx = Fixture::new();
        let double = fx.numeric(NumericKind::Double);
        let int = fx.numeric(NumericKind::Int32);

        let tried = fx.resolver().resolve(double, int, ConversionMode::ExplicitTry);
        assert_eq!(tried.plan, ConversionPlan::Failure(ConversionMode::ExplicitTry));
        assert!(!tried.is_error());
        assert_eq!(tried.result_type, fx.types.well_known().object);
        // Widening still applies under the try mode.
        assert!(!fx.plan(int, double, ConversionMode::ExplicitTry).is_failure());
    }

    #[test]
    fn test_null_conversions() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);

        for target in [wk.string, wk.object, fx.colony] {
            assert_eq!(
                fx.plan(wk.null, target, ConversionMode::ImplicitCast),
                ConversionPlan::NullToReference
            );
        }
        assert_eq!(
            fx.plan(wk.null, int, ConversionMode::ImplicitCast),
            ConversionPlan::Failure(ConversionMode::ImplicitCast)
        );
        assert_eq!(
            fx.plan(wk.null, fx.nullable(NumericKind::Int32), ConversionMode::ImplicitCast),
            ConversionPlan::NullableWrap(NullableWrapKind::Empty)
        );
    }

    #[test]
    fn test_box_and_assignable() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);

        assert_eq!(fx.plan(int, int, ConversionMode::ImplicitCast), ConversionPlan::Identity);
        assert_eq!(fx.plan(int, wk.object, ConversionMode::ImplicitCast), ConversionPlan::Box);
        assert_eq!(
            fx.plan(fx.colony, wk.object, ConversionMode::ImplicitCast),
            ConversionPlan::Assignable
        );
        assert_eq!(
            fx.plan(fx.colony, fx.planet, ConversionMode::ImplicitCast),
            ConversionPlan::Assignable
        );
    }

    #[test]
    fn test_explicit_reference_conversions() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);

        assert!(fx.plan(fx.planet, fx.colony, ConversionMode::ImplicitCast).is_failure());
        assert_eq!(
            fx.plan(fx.planet, fx.colony, ConversionMode::ExplicitCast),
            ConversionPlan::Downcast
        );
        assert_eq!(
            fx.plan(wk.object, int, ConversionMode::ExplicitTry),
            ConversionPlan::Unbox
        );
    }

    #[test]
    fn test_unwrap_extensible() {
        let fx = Fixture::new();
        let int = fx.numeric(NumericKind::Int32);
        let wrapper = fx.types.find_instance(fx.types.well_known().extensible, &[int]).unwrap();

        assert_eq!(
            fx.plan(wrapper, int, ConversionMode::ImplicitCast),
            ConversionPlan::UnwrapExtensible(Box::new(ConversionPlan::Identity))
        );
        assert_eq!(
            fx.plan(wrapper, fx.numeric(NumericKind::Double), ConversionMode::ImplicitCast),
            ConversionPlan::UnwrapExtensible(Box::new(ConversionPlan::NumericWiden {
                from: NumericKind::Int32,
                to: NumericKind::Double
            }))
        );
        assert!(matches!(
            fx.plan(wrapper, fx.credits, ConversionMode::ImplicitCast),
            ConversionPlan::UnwrapExtensible(inner)
                if matches!(*inner, ConversionPlan::UserDefined { is_implicit: true, .. })
        ));
    }

    #[test]
    fn test_user_defined_search_order() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);
        let credits_methods = &fx.types.get(fx.credits).methods;

        // Found on the target type.
        assert_eq!(
            fx.plan(int, fx.credits, ConversionMode::ImplicitCast),
            ConversionPlan::UserDefined {
                method: credits_methods[0],
                is_implicit: true
            }
        );
        // op_Explicit only in explicit modes.
        assert!(fx.plan(fx.credits, int, ConversionMode::ImplicitCast).is_failure());
        assert_eq!(
            fx.plan(fx.credits, int, ConversionMode::ExplicitCast),
            ConversionPlan::UserDefined {
                method: credits_methods[1],
                is_implicit: false
            }
        );
        // Explicit-only ConvertTo methods are skipped by implicit searches.
        assert!(fx.plan(fx.credits, wk.string, ConversionMode::ImplicitTry).is_failure());
        assert_eq!(
            fx.plan(fx.credits, wk.string, ConversionMode::ExplicitTry),
            ConversionPlan::UserDefined {
                method: credits_methods[2],
                is_implicit: false
            }
        );
        // Inherited static conversion on the base type.
        assert!(matches!(
            fx.plan(fx.colony, wk.string, ConversionMode::ImplicitCast),
            ConversionPlan::UserDefined { is_implicit: true, .. }
        ));
    }

    #[test]
    fn test_nullable_wrapping() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);
        let nullable_int = fx.nullable(NumericKind::Int32);
        let nullable_long = fx.nullable(NumericKind::Int64);

        assert_eq!(
            fx.plan(int, nullable_int, ConversionMode::ImplicitCast),
            ConversionPlan::NullableWrap(NullableWrapKind::Wrap)
        );
        assert!(fx.plan(int, nullable_long, ConversionMode::ImplicitCast).is_failure());
        assert_eq!(
            fx.plan(int, nullable_long, ConversionMode::ExplicitCast),
            ConversionPlan::NullableWrap(NullableWrapKind::ConvertThenWrap(Box::new(
                ConversionPlan::NumericWiden {
                    from: NumericKind::Int32,
                    to: NumericKind::Int64
                }
            )))
        );

        let failed = fx
            .resolver()
            .resolve(wk.string, nullable_int, ConversionMode::ExplicitTry);
        assert_eq!(failed.plan, ConversionPlan::Failure(ConversionMode::ExplicitTry));
        assert!(!failed.is_error());
        assert_eq!(failed.result_type, wk.object);
    }

    #[test]
    fn test_result_type_coercions() {
        let fx = Fixture::new();
        let wk = fx.types.well_known();
        let int = fx.numeric(NumericKind::Int32);
        let double = fx.numeric(NumericKind::Double);
        let resolver = fx.resolver();

        assert_eq!(resolver.resolve(int, double, ConversionMode::ImplicitTry).result_type, wk.object);
        assert_eq!(resolver.resolve(int, double, ConversionMode::ExplicitCast).result_type, double);
        assert_eq!(
            resolver.resolve(wk.null, wk.string, ConversionMode::ImplicitTry).result_type,
            wk.string
        );

        let failed = resolver.resolve(wk.string, int, ConversionMode::ImplicitCast);
        assert!(failed.is_error());
        assert_eq!(failed.result_type, int);
    }

    #[test]
    fn test_can_convert() {
        let fx = Fixture::new();
        let int = fx.numeric(NumericKind::Int32);
        let double = fx.numeric(NumericKind::Double);
        let resolver = fx.resolver();

        assert!(!resolver.can_convert(int, double, false, NarrowingLevel::None));
        assert!(resolver.can_convert(fx.colony, fx.planet, false, NarrowingLevel::None));
        assert!(resolver.can_convert(int, double, false, NarrowingLevel::One));
        assert!(!resolver.can_convert(double, int, true, NarrowingLevel::Two));
        assert!(resolver.can_convert(double, int, true, NarrowingLevel::Three));
        assert_eq!(resolver.prefer_convert(int, double), Candidate::Ambiguous);
    }

    #[test]
    fn test_render() {
        let fx = Fixture::new();
        let resolver = fx.resolver();
        let int = fx.numeric(NumericKind::Int32);

        let widen = resolver.resolve(int, fx.numeric(NumericKind::Double), ConversionMode::ImplicitCast);
        assert_snapshot!(
            widen.render(&fx.types),
            @"System.Int32 -> System.Double [ImplicitCast]: NumericWiden(Int32 -> Double)"
        );

        let user = resolver.resolve(fx.credits, int, ConversionMode::ExplicitCast);
        assert_snapshot!(
            user.render(&fx.types),
            @"Game.Credits -> System.Int32 [ExplicitCast]: UserDefined(Game.Credits.op_Explicit(Game.Credits), explicit)"
        );
    }
}
