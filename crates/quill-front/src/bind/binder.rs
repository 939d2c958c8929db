//! Expression binding.
//!
//! The binder walks the syntax tree once, resolving names through the
//! [`NameResolver`], members through the runtime's member cache and every
//! implicit or explicit conversion through the conversion resolver. Operands
//! of static type `Object` are late bound: the binder emits a dynamic node
//! carrying the shared dispatch descriptor instead of resolving a member.
//!
//! Errors are reported to the resolver and replaced by [`BoundKind::Error`]
//! nodes; parents of an error node never report a second error.

use std::collections::HashMap;
use std::sync::Arc;

use quill_core::diagnostic::codes;
use quill_core::{
    CompilationPhase, Diagnostic, Entity, MethodId, NumericKind, Span, TypeId, TypeTable,
};
use quill_runtime::numeric::{arithmetic_promotion, is_implicitly_convertible};
use quill_runtime::{
    BinaryOperator, Candidate, ConversionMode, ConversionPlan, DispatchDescriptor, NarrowingLevel,
    UnaryOperator,
};
use tracing::trace;

use super::tree::{BoundExpr, BoundKind};
use crate::flags::ScopeFlags;
use crate::resolver::NameResolver;
use crate::syntax::{Expr, ExprKind, Ident, Literal, TypeName};
use crate::syntax::ast::{IntSuffix, RealSuffix};

/// Candidate result types for binary numeric promotion, narrowest first.
const PROMOTION_ORDER: [NumericKind; 7] = [
    NumericKind::Int32,
    NumericKind::UInt32,
    NumericKind::Int64,
    NumericKind::UInt64,
    NumericKind::Single,
    NumericKind::Double,
    NumericKind::Decimal,
];

/// What an expression denotes before it is used as a value.
enum Resolved {
    Value(BoundExpr),
    Type(TypeId, Span),
    Namespace(Entity, Span),
    Methods(MethodGroup),
}

enum GroupTarget {
    Static,
    Instance(Box<BoundExpr>),
    Extension(Box<BoundExpr>),
}

struct MethodGroup {
    name: String,
    target: GroupTarget,
    methods: Vec<MethodId>,
    span: Span,
}

enum Overload {
    Found(MethodId),
    Ambiguous(MethodId, MethodId),
    NoMatch,
}

pub struct Binder<'r, 'rt> {
    resolver: &'r NameResolver<'rt>,
    parameters: HashMap<String, TypeId>,
}

impl<'r, 'rt> Binder<'r, 'rt> {
    pub fn new(resolver: &'r NameResolver<'rt>) -> Self {
        Self {
            resolver,
            parameters: HashMap::new(),
        }
    }

    /// Declare a script parameter. Parameters shadow every other name.
    pub fn with_parameter(mut self, name: impl Into<String>, ty: TypeId) -> Self {
        self.parameters.insert(name.into(), ty);
        self
    }

    fn types(&self) -> &'rt TypeTable {
        self.resolver.runtime().types()
    }

    fn object(&self) -> TypeId {
        self.types().well_known().object
    }

    fn error(&self, span: Span) -> BoundExpr {
        BoundExpr::new(BoundKind::Error, self.object(), span)
    }

    fn report(&self, code: u32, message: String, span: Span) {
        self.resolver.report(Diagnostic::error(
            code,
            message,
            span,
            CompilationPhase::Binding,
        ));
    }

    fn name_of(&self, ty: TypeId) -> String {
        self.types().display_name(ty)
    }

    fn checked(&self) -> bool {
        self.resolver.flags().has_set(ScopeFlags::CHECKED_SCOPE)
    }

    /// Bind `expr` as a value.
    pub fn bind(&self, expr: &Expr) -> BoundExpr {
        let resolved = self.bind_entity(expr);
        self.into_value(resolved)
    }

    /// Bind `expr` and convert it to `target` as an implicit conversion.
    pub fn bind_as(&self, expr: &Expr, target: TypeId) -> BoundExpr {
        let bound = self.bind(expr);
        self.convert(bound, target, ConversionMode::ImplicitCast)
    }

    fn into_value(&self, resolved: Resolved) -> BoundExpr {
        match resolved {
            Resolved::Value(value) => value,
            Resolved::Type(ty, span) => {
                self.report(
                    codes::TYPE_USED_AS_VALUE,
                    format!("'{}' is a type, which is not valid in the given context", self.name_of(ty)),
                    span,
                );
                self.error(span)
            }
            Resolved::Namespace(entity, span) => {
                let name = self
                    .resolver
                    .runtime()
                    .namespaces()
                    .tree()
                    .display_name(&entity, self.types());
                self.report(
                    codes::NAMESPACE_USED_AS_VALUE,
                    format!("'{name}' is a namespace but is used like a variable"),
                    span,
                );
                self.error(span)
            }
            Resolved::Methods(group) => {
                self.report(
                    codes::METHOD_GROUP_AS_VALUE,
                    format!(
                        "Cannot convert method group '{}' to non-delegate type",
                        group.name
                    ),
                    group.span,
                );
                self.error(group.span)
            }
        }
    }

    fn bind_entity(&self, expr: &Expr) -> Resolved {
        match &expr.kind {
            ExprKind::Literal(literal) => Resolved::Value(self.bind_literal(literal, expr.span)),
            ExprKind::Name(ident) => self.bind_name(ident),
            ExprKind::Member { target, name } => {
                let target = self.bind_entity(target);
                self.member_of(target, name, expr.span, false)
            }
            ExprKind::Call { callee, args } => {
                Resolved::Value(self.bind_call(callee, args, expr.span))
            }
            ExprKind::Index { target, args } => {
                Resolved::Value(self.bind_index(target, args, expr.span))
            }
            ExprKind::Unary { op, operand } => {
                Resolved::Value(self.bind_unary(*op, operand, expr.span))
            }
            ExprKind::Binary { op, left, right } => {
                Resolved::Value(self.bind_binary(*op, left, right, expr.span))
            }
            ExprKind::Cast { ty, expr: operand } => {
                Resolved::Value(self.bind_cast(ty, operand, expr.span))
            }
            ExprKind::As { expr: operand, ty } => {
                Resolved::Value(self.bind_as_operator(operand, ty, expr.span))
            }
            ExprKind::Checked {
                checked,
                expr: inner,
            } => {
                let _scope = self
                    .resolver
                    .flags()
                    .with(ScopeFlags::CHECKED_SCOPE, *checked);
                self.bind_entity(inner)
            }
        }
    }

    fn bind_literal(&self, literal: &Literal, span: Span) -> BoundExpr {
        let wk = self.types().well_known();
        let ty = match *literal {
            Literal::Int { value, suffix } => wk.numeric(integer_literal_kind(value, suffix)),
            Literal::Real { suffix, .. } => wk.numeric(match suffix {
                RealSuffix::Float => NumericKind::Single,
                RealSuffix::Decimal => NumericKind::Decimal,
                RealSuffix::None | RealSuffix::Double => NumericKind::Double,
            }),
            Literal::Str(_) => wk.string,
            Literal::Bool(_) => wk.boolean,
            Literal::Null => wk.null,
        };
        BoundExpr::new(BoundKind::Literal(literal.clone()), ty, span)
    }

    fn bind_name(&self, ident: &Ident) -> Resolved {
        if let Some(&ty) = self.parameters.get(&ident.name) {
            return Resolved::Value(BoundExpr::new(
                BoundKind::Parameter(ident.name.clone()),
                ty,
                ident.span,
            ));
        }
        let reported = self.resolver.error_count();
        match self.lookup_name(ident, 0) {
            Some(Entity::Type(ty)) => Resolved::Type(ty, ident.span),
            Some(entity) => Resolved::Namespace(entity, ident.span),
            None => {
                // An ambiguous reference has been reported already.
                if self.resolver.error_count() == reported {
                    self.report(
                        codes::NAME_NOT_FOUND,
                        format!("The name '{}' does not exist in the current context", ident.name),
                        ident.span,
                    );
                }
                Resolved::Value(self.error(ident.span))
            }
        }
    }

    /// `resolve_name`, falling back to the host's alias groups when the
    /// name is simply unknown.
    fn lookup_name(&self, ident: &Ident, arity: u32) -> Option<Entity> {
        let reported = self.resolver.error_count();
        self.resolver
            .resolve_name(&ident.name, ident.span, false, arity)
            .or_else(|| {
                if self.resolver.error_count() == reported {
                    self.resolver.resolve_alias(&ident.name)
                } else {
                    None
                }
            })
    }

    fn member_of(&self, target: Resolved, name: &Ident, span: Span, suppress_errors: bool) -> Resolved {
        match target {
            Resolved::Namespace(entity, _) => {
                let tree = self.resolver.runtime().namespaces().tree();
                match tree.lookup_in(&entity, &name.name, 0) {
                    Some(Entity::Type(ty)) => Resolved::Type(ty, span),
                    Some(inner) => Resolved::Namespace(inner, span),
                    None => {
                        self.report(
                            codes::NAMESPACE_MEMBER_NOT_FOUND,
                            format!(
                                "The type or namespace name '{}' does not exist in the namespace '{}'",
                                name.name,
                                tree.display_name(&entity, self.types())
                            ),
                            name.span,
                        );
                        Resolved::Value(self.error(span))
                    }
                }
            }
            Resolved::Type(ty, _) => self.static_member(ty, name, span),
            Resolved::Value(value) => self.instance_member(value, name, span, suppress_errors),
            Resolved::Methods(group) => {
                let group_span = group.span;
                let _ = self.into_value(Resolved::Methods(group));
                Resolved::Value(self.error(group_span.to(span)))
            }
        }
    }

    fn static_member(&self, ty: TypeId, name: &Ident, span: Span) -> Resolved {
        if let Some((declaring, property_type)) = self.find_property(ty, &name.name, true) {
            return Resolved::Value(BoundExpr::new(
                BoundKind::Property {
                    target: None,
                    declaring,
                    name: name.name.clone(),
                },
                property_type,
                span,
            ));
        }
        let methods = self.methods_named(ty, &name.name, true);
        if !methods.is_empty() {
            return Resolved::Methods(MethodGroup {
                name: name.name.clone(),
                target: GroupTarget::Static,
                methods,
                span,
            });
        }
        self.report_missing_member(ty, name);
        Resolved::Value(self.error(span))
    }

    fn instance_member(
        &self,
        value: BoundExpr,
        name: &Ident,
        span: Span,
        suppress_errors: bool,
    ) -> Resolved {
        if value.is_error() {
            return Resolved::Value(self.error(span));
        }
        if value.ty == self.object() {
            let descriptor = self
                .resolver
                .runtime()
                .binders()
                .get_member(&name.name, suppress_errors);
            return Resolved::Value(self.dynamic(descriptor, vec![value], span));
        }
        if let Some((declaring, property_type)) = self.find_property(value.ty, &name.name, false) {
            return Resolved::Value(BoundExpr::new(
                BoundKind::Property {
                    target: Some(Box::new(value)),
                    declaring,
                    name: name.name.clone(),
                },
                property_type,
                span,
            ));
        }
        let methods = self.methods_named(value.ty, &name.name, false);
        if !methods.is_empty() {
            return Resolved::Methods(MethodGroup {
                name: name.name.clone(),
                target: GroupTarget::Instance(Box::new(value)),
                methods,
                span,
            });
        }
        if let Some(group) = self.extension_group(value.clone(), &name.name, span) {
            return Resolved::Methods(group);
        }
        self.report_missing_member(value.ty, name);
        Resolved::Value(self.error(span))
    }

    fn extension_group(&self, receiver: BoundExpr, name: &str, span: Span) -> Option<MethodGroup> {
        let group = self
            .resolver
            .resolve_extension_method(receiver.ty, name, span)?;
        Some(MethodGroup {
            name: name.to_owned(),
            target: GroupTarget::Extension(Box::new(receiver)),
            methods: group.methods,
            span,
        })
    }

    fn report_missing_member(&self, ty: TypeId, name: &Ident) {
        self.report(
            codes::MEMBER_NOT_FOUND,
            format!(
                "'{}' does not contain a definition for '{}'",
                self.name_of(ty),
                name.name
            ),
            name.span,
        );
    }

    /// A property on `ty`, its base types or its interfaces, with its type
    /// substituted for the instance it was found on.
    fn find_property(&self, ty: TypeId, name: &str, is_static: bool) -> Option<(TypeId, TypeId)> {
        let types = self.types();
        std::iter::once(ty)
            .chain(types.base_chain(ty))
            .chain(types.all_interfaces(ty))
            .find_map(|current| {
                let definition = types.open_definition(current);
                types
                    .get(definition)
                    .properties
                    .iter()
                    .find(|p| p.name == name && p.is_static == is_static)
                    .map(|p| (definition, types.substitute_existing(p.ty, current)))
            })
    }

    fn methods_named(&self, ty: TypeId, name: &str, is_static: bool) -> Vec<MethodId> {
        let types = self.types();
        self.resolver
            .runtime()
            .members()
            .lookup(types, ty, name)
            .into_iter()
            .filter(|&m| {
                let method = types.method(m);
                method.is_public && method.is_static == is_static
            })
            .collect()
    }

    fn dynamic(
        &self,
        descriptor: Arc<DispatchDescriptor>,
        operands: Vec<BoundExpr>,
        span: Span,
    ) -> BoundExpr {
        BoundExpr::new(
            BoundKind::Dynamic {
                descriptor,
                operands,
            },
            self.object(),
            span,
        )
    }

    // =========================================================================
    // Calls and indexing
    // =========================================================================

    fn bind_call(&self, callee: &Expr, args: &[Expr], span: Span) -> BoundExpr {
        let args: Vec<BoundExpr> = args.iter().map(|arg| self.bind(arg)).collect();
        let binders = self.resolver.runtime().binders();

        let resolved = match &callee.kind {
            ExprKind::Member { target, name } => {
                match self.bind_entity(target) {
                    Resolved::Value(receiver)
                        if receiver.ty == self.object() && !receiver.is_error() =>
                    {
                        let descriptor = binders.invoke_member(&name.name, args.len());
                        let operands = std::iter::once(receiver).chain(args).collect();
                        return self.dynamic(descriptor, operands, span);
                    }
                    target => self.member_of(target, name, callee.span, false),
                }
            }
            _ => self.bind_entity(callee),
        };

        match resolved {
            Resolved::Methods(group) => {
                if args.iter().any(BoundExpr::is_error) {
                    return self.error(span);
                }
                self.invoke_group(group, args, span)
            }
            Resolved::Value(value) if value.is_error() => self.error(span),
            Resolved::Value(value) if value.ty == self.object() => {
                let descriptor = binders.invoke(args.len());
                let operands = std::iter::once(value).chain(args).collect();
                self.dynamic(descriptor, operands, span)
            }
            Resolved::Value(_) => {
                self.report(
                    codes::NOT_INVOCABLE,
                    format!("Non-invocable member '{callee}' cannot be used like a method"),
                    callee.span,
                );
                self.error(span)
            }
            other => {
                let _ = self.into_value(other);
                self.error(span)
            }
        }
    }

    fn invoke_group(&self, group: MethodGroup, args: Vec<BoundExpr>, span: Span) -> BoundExpr {
        let receiver = match &group.target {
            GroupTarget::Static => None,
            GroupTarget::Instance(receiver) | GroupTarget::Extension(receiver) => {
                Some(receiver.ty)
            }
        };
        let mut arg_types: Vec<TypeId> = args.iter().map(|arg| arg.ty).collect();
        if let GroupTarget::Extension(receiver) = &group.target {
            arg_types.insert(0, receiver.ty);
        }

        match self.select_overload(&group, receiver, &arg_types) {
            Overload::Found(method) => {
                trace!(method = %self.types().method_signature(method), "selected overload");
                self.build_call(group.target, method, receiver, args, span)
            }
            Overload::Ambiguous(first, second) => {
                let types = self.types();
                self.report(
                    codes::AMBIGUOUS_CALL,
                    format!(
                        "The call is ambiguous between the following methods: '{}' and '{}'",
                        types.method_signature(first),
                        types.method_signature(second)
                    ),
                    group.span,
                );
                self.error(span)
            }
            Overload::NoMatch => {
                // Instance methods that do not fit give way to extensions.
                if let GroupTarget::Instance(receiver) = &group.target
                    && let Some(extensions) =
                        self.extension_group(receiver.as_ref().clone(), &group.name, group.span)
                {
                    return self.invoke_group(extensions, args, span);
                }
                let given = match group.target {
                    GroupTarget::Extension(_) => arg_types.len() - 1,
                    _ => arg_types.len(),
                };
                self.report(
                    codes::NO_MATCHING_OVERLOAD,
                    format!("No overload for method '{}' takes {given} arguments of these types", group.name),
                    group.span,
                );
                self.error(span)
            }
        }
    }

    /// Exact matches first, then matches through implicit conversions.
    fn select_overload(
        &self,
        group: &MethodGroup,
        receiver: Option<TypeId>,
        arg_types: &[TypeId],
    ) -> Overload {
        let _probe = self.resolver.flags().set(ScopeFlags::PROBING_MODE);
        let conversions = self.resolver.runtime().conversions();
        for level in [NarrowingLevel::None, NarrowingLevel::One] {
            let applicable: Vec<MethodId> = group
                .methods
                .iter()
                .copied()
                .filter(|&method| {
                    let parameters = self.parameter_types(method, receiver);
                    parameters.len() == arg_types.len()
                        && parameters.iter().zip(arg_types).all(|(&parameter, &arg)| {
                            if self.types().contains_generic_parameters(parameter) {
                                self.types().is_assignable_from_open(parameter, arg)
                            } else {
                                conversions.can_convert(arg, parameter, false, level)
                            }
                        })
                })
                .collect();
            match applicable.as_slice() {
                [] => continue,
                [only] => return Overload::Found(*only),
                [first, second, ..] => {
                    let a = self.parameter_types(*first, receiver);
                    let b = self.parameter_types(*second, receiver);
                    let preference = a
                        .iter()
                        .zip(&b)
                        .find(|(x, y)| x != y)
                        .map_or(Candidate::Equivalent, |(&x, &y)| {
                            conversions.prefer_convert(x, y)
                        });
                    return match preference {
                        Candidate::One => Overload::Found(*first),
                        Candidate::Two => Overload::Found(*second),
                        Candidate::Equivalent | Candidate::Ambiguous => {
                            Overload::Ambiguous(*first, *second)
                        }
                    };
                }
            }
        }
        Overload::NoMatch
    }

    /// The instance of a generic type that supplies the type arguments for
    /// `method` when called on `receiver`.
    fn generic_context(&self, method: MethodId, receiver: Option<TypeId>) -> Option<TypeId> {
        let types = self.types();
        let receiver = receiver?;
        let def = types.method(method);
        let generic_owner = if def.is_extension {
            types.open_definition(*def.parameters.first()?)
        } else {
            def.declaring_type
        };
        std::iter::once(receiver)
            .chain(types.base_chain(receiver))
            .chain(types.all_interfaces(receiver))
            .find(|&candidate| types.open_definition(candidate) == generic_owner)
    }

    fn substitute(&self, ty: TypeId, context: Option<TypeId>) -> TypeId {
        match context {
            Some(instance) => self.types().substitute_existing(ty, instance),
            None => ty,
        }
    }

    fn parameter_types(&self, method: MethodId, receiver: Option<TypeId>) -> Vec<TypeId> {
        let context = self.generic_context(method, receiver);
        self.types()
            .method(method)
            .parameters
            .iter()
            .map(|&parameter| self.substitute(parameter, context))
            .collect()
    }

    fn build_call(
        &self,
        target: GroupTarget,
        method: MethodId,
        receiver: Option<TypeId>,
        args: Vec<BoundExpr>,
        span: Span,
    ) -> BoundExpr {
        let context = self.generic_context(method, receiver);
        let return_type = self.substitute(self.types().method(method).return_type, context);
        let parameters = self.parameter_types(method, receiver);

        let mut all_args: Vec<BoundExpr> = Vec::with_capacity(parameters.len());
        let instance = match target {
            GroupTarget::Static => None,
            GroupTarget::Instance(receiver) => Some(receiver),
            GroupTarget::Extension(receiver) => {
                all_args.push(*receiver);
                None
            }
        };
        all_args.extend(args);
        let converted: Vec<BoundExpr> = all_args
            .into_iter()
            .zip(&parameters)
            .map(|(arg, &parameter)| {
                if self.types().contains_generic_parameters(parameter) {
                    arg
                } else {
                    self.convert(arg, parameter, ConversionMode::ImplicitCast)
                }
            })
            .collect();

        let kind = if self.types().method(method).is_extension {
            BoundKind::ExtensionCall {
                method,
                args: converted,
            }
        } else {
            BoundKind::Call {
                target: instance,
                method,
                args: converted,
            }
        };
        BoundExpr::new(kind, return_type, span)
    }

    fn bind_index(&self, target: &Expr, args: &[Expr], span: Span) -> BoundExpr {
        let target = self.bind(target);
        let args: Vec<BoundExpr> = args.iter().map(|arg| self.bind(arg)).collect();
        if target.is_error() || args.iter().any(BoundExpr::is_error) {
            return self.error(span);
        }
        if target.ty == self.object() {
            let descriptor = self.resolver.runtime().binders().get_index(args.len());
            let operands = std::iter::once(target).chain(args).collect();
            return self.dynamic(descriptor, operands, span);
        }
        let methods = self.methods_named(target.ty, "get_Item", false);
        if methods.is_empty() {
            self.report(
                codes::CANNOT_INDEX,
                format!(
                    "Cannot apply indexing with [] to an expression of type '{}'",
                    self.name_of(target.ty)
                ),
                span,
            );
            return self.error(span);
        }
        let group = MethodGroup {
            name: "get_Item".to_owned(),
            target: GroupTarget::Instance(Box::new(target)),
            methods,
            span,
        };
        self.invoke_group(group, args, span)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    /// Numeric kind of `expr`, looking through `Extensible<T>`.
    fn numeric_operand(&self, expr: &BoundExpr) -> Option<NumericKind> {
        let types = self.types();
        types.numeric_kind(expr.ty).or_else(|| {
            types
                .extensible_underlying(expr.ty)
                .and_then(|underlying| types.numeric_kind(underlying))
        })
    }

    fn bind_unary(&self, op: UnaryOperator, operand: &Expr, span: Span) -> BoundExpr {
        let operand = self.bind(operand);
        if operand.is_error() {
            return self.error(span);
        }
        let wk = self.types().well_known();
        let descriptor = self.resolver.runtime().binders().unary_op(op);
        let checked = self.checked();

        let (operand, ty) = if operand.ty == wk.object {
            (operand, wk.object)
        } else {
            let result = match op {
                UnaryOperator::Not => self.can_implicitly_convert(operand.ty, wk.boolean).then_some(wk.boolean),
                UnaryOperator::Negate | UnaryOperator::Plus => {
                    self.numeric_operand(&operand).and_then(|kind| {
                        match (op, arithmetic_promotion(kind)) {
                            (UnaryOperator::Negate, NumericKind::UInt64) => None,
                            (UnaryOperator::Negate, NumericKind::UInt32) => Some(NumericKind::Int64),
                            (_, promoted) => Some(promoted),
                        }
                    })
                    .map(|kind| wk.numeric(kind))
                }
            };
            let Some(ty) = result else {
                self.report(
                    codes::UNARY_OPERATOR_NOT_APPLICABLE,
                    format!(
                        "Operator '{op}' cannot be applied to operand of type '{}'",
                        self.name_of(operand.ty)
                    ),
                    span,
                );
                return self.error(span);
            };
            (self.convert(operand, ty, ConversionMode::ImplicitCast), ty)
        };
        BoundExpr::new(
            BoundKind::Unary {
                op,
                operand: Box::new(operand),
                descriptor,
                checked,
            },
            ty,
            span,
        )
    }

    fn bind_binary(&self, op: BinaryOperator, left: &Expr, right: &Expr, span: Span) -> BoundExpr {
        let left = self.bind(left);
        let right = self.bind(right);
        if left.is_error() || right.is_error() {
            return self.error(span);
        }
        let Some((operand_type, result_type)) = self.binary_signature(op, &left, &right) else {
            self.report(
                codes::OPERATOR_NOT_APPLICABLE,
                format!(
                    "Operator '{op}' cannot be applied to operands of type '{}' and '{}'",
                    self.name_of(left.ty),
                    self.name_of(right.ty)
                ),
                span,
            );
            return self.error(span);
        };
        let (left, right) = match operand_type {
            OperandTypes::Same(ty) => (
                self.convert(left, ty, ConversionMode::ImplicitCast),
                self.convert(right, ty, ConversionMode::ImplicitCast),
            ),
            OperandTypes::Each(l, r) => (
                self.convert(left, l, ConversionMode::ImplicitCast),
                self.convert(right, r, ConversionMode::ImplicitCast),
            ),
        };
        BoundExpr::new(
            BoundKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                descriptor: self.resolver.runtime().binders().binary_op(op),
                checked: self.checked(),
            },
            result_type,
            span,
        )
    }

    /// Operand types both sides are converted to, and the result type.
    fn binary_signature(
        &self,
        op: BinaryOperator,
        left: &BoundExpr,
        right: &BoundExpr,
    ) -> Option<(OperandTypes, TypeId)> {
        let types = self.types();
        let wk = types.well_known();

        if left.ty == wk.object || right.ty == wk.object {
            return Some((OperandTypes::Each(left.ty, right.ty), wk.object));
        }
        if op.is_logical() {
            return (self.can_implicitly_convert(left.ty, wk.boolean)
                && self.can_implicitly_convert(right.ty, wk.boolean))
            .then_some((OperandTypes::Same(wk.boolean), wk.boolean));
        }
        if op == BinaryOperator::Add && (left.ty == wk.string || right.ty == wk.string) {
            let side = |ty: TypeId| if ty == wk.string { ty } else { wk.object };
            return Some((OperandTypes::Each(side(left.ty), side(right.ty)), wk.string));
        }
        if let (Some(l), Some(r)) = (self.numeric_operand(left), self.numeric_operand(right)) {
            let (l, r) = (arithmetic_promotion(l), arithmetic_promotion(r));
            let common = PROMOTION_ORDER
                .into_iter()
                .find(|&k| is_implicitly_convertible(l, k) && is_implicitly_convertible(r, k))?;
            let common = wk.numeric(common);
            let result = if op.is_arithmetic() { common } else { wk.boolean };
            return Some((OperandTypes::Same(common), result));
        }
        if !op.is_equality() {
            return None;
        }
        if left.ty == wk.boolean && right.ty == wk.boolean {
            return Some((OperandTypes::Same(wk.boolean), wk.boolean));
        }
        // Reference equality, and comparisons against `null`.
        let comparable = |from: TypeId, to: TypeId| {
            from == to
                || (from == wk.null
                    && (types.is_reference_type(to) || types.nullable_underlying(to).is_some()))
                || (types.is_reference_type(to) && types.is_assignable_from(to, from))
        };
        if comparable(right.ty, left.ty) {
            Some((OperandTypes::Same(left.ty), wk.boolean))
        } else if comparable(left.ty, right.ty) {
            Some((OperandTypes::Same(right.ty), wk.boolean))
        } else {
            None
        }
    }

    fn can_implicitly_convert(&self, from: TypeId, to: TypeId) -> bool {
        self.resolver
            .runtime()
            .conversions()
            .can_convert(from, to, false, NarrowingLevel::One)
    }

    // =========================================================================
    // Conversions
    // =========================================================================

    fn bind_cast(&self, ty: &TypeName, operand: &Expr, span: Span) -> BoundExpr {
        let operand = self.bind(operand);
        let Some(target) = self.resolve_type(ty) else {
            return self.error(span);
        };
        let converted = self.convert(operand, target, ConversionMode::ExplicitCast);
        BoundExpr { span, ..converted }
    }

    fn bind_as_operator(&self, operand: &Expr, ty: &TypeName, span: Span) -> BoundExpr {
        // Member reads under `as` do not fail on missing members at run time.
        let operand = match &operand.kind {
            ExprKind::Member { target, name } => {
                let target = self.bind_entity(target);
                let resolved = self.member_of(target, name, operand.span, true);
                self.into_value(resolved)
            }
            _ => self.bind(operand),
        };
        let Some(target) = self.resolve_type(ty) else {
            return self.error(span);
        };
        if operand.is_error() {
            return self.error(span);
        }
        let binders = self.resolver.runtime().binders();
        let descriptor = if self.types().is_value_type(target) {
            binders.convert_to_object(target, ConversionMode::ExplicitTry)
        } else {
            binders.convert(target, ConversionMode::ExplicitTry)
        };
        let converted = self.convert_with(operand, descriptor);
        BoundExpr { span, ..converted }
    }

    /// Convert `expr` to `target`, reporting a failure under a cast mode.
    /// Identity conversions add no node.
    pub fn convert(&self, expr: BoundExpr, target: TypeId, mode: ConversionMode) -> BoundExpr {
        if expr.is_error() {
            return expr;
        }
        let descriptor = self.resolver.runtime().binders().convert(target, mode);
        self.convert_with(expr, descriptor)
    }

    fn convert_with(&self, expr: BoundExpr, descriptor: Arc<DispatchDescriptor>) -> BoundExpr {
        let conversions = self.resolver.runtime().conversions();
        let Some(conversion) = descriptor.bind_conversion(&conversions, expr.ty) else {
            return expr;
        };
        if conversion.plan == ConversionPlan::Identity && conversion.result_type == expr.ty {
            return expr;
        }
        if conversion.is_error() {
            let (code, message) = if conversion.mode.is_explicit() {
                (codes::CANNOT_CONVERT, "Cannot convert type")
            } else {
                (codes::CANNOT_CONVERT_IMPLICITLY, "Cannot implicitly convert type")
            };
            self.report(
                code,
                format!(
                    "{message} '{}' to '{}'",
                    self.name_of(conversion.source),
                    self.name_of(conversion.target)
                ),
                expr.span,
            );
            return self.error(expr.span);
        }
        let (ty, span) = (conversion.result_type, expr.span);
        BoundExpr::new(
            BoundKind::Convert {
                operand: Box::new(expr),
                conversion,
                descriptor,
                checked: self.checked(),
            },
            ty,
            span,
        )
    }

    /// Resolve a type as written in a cast, `as` expression or parameter
    /// declaration. Generic and nullable types must already exist in the
    /// host's type table.
    pub fn resolve_type(&self, name: &TypeName) -> Option<TypeId> {
        let types = self.types();
        let tree = self.resolver.runtime().namespaces().tree();
        let arity = name.arguments.len() as u32;
        let (last, prefix) = name.path.split_last()?;

        let reported = self.resolver.error_count();
        let found = if prefix.is_empty() {
            self.resolver
                .resolve_name(&last.name, last.span, false, arity)
        } else {
            self.lookup_name(&prefix[0], 0)
                .and_then(|start| {
                    prefix[1..].iter().try_fold(start, |entity, ident| {
                        tree.lookup_in(&entity, &ident.name, 0)
                    })
                })
                .and_then(|namespace| tree.lookup_in(&namespace, &last.name, arity))
        };
        let definition = match found {
            Some(Entity::Type(ty)) => ty,
            _ => {
                if self.resolver.error_count() == reported {
                    self.report(
                        codes::NAMESPACE_NOT_FOUND,
                        format!("The type or namespace name '{name}' could not be found"),
                        name.span,
                    );
                }
                return None;
            }
        };

        let mut ty = definition;
        if !name.arguments.is_empty() {
            let arguments = name
                .arguments
                .iter()
                .map(|argument| self.resolve_type(argument))
                .collect::<Option<Vec<_>>>()?;
            ty = self.existing_instance(definition, &arguments, name)?;
        }
        if name.nullable && types.is_value_type(ty) {
            ty = self.existing_instance(types.well_known().nullable, &[ty], name)?;
        }
        Some(ty)
    }

    fn existing_instance(&self, definition: TypeId, arguments: &[TypeId], name: &TypeName) -> Option<TypeId> {
        let instance = self.types().find_instance(definition, arguments);
        if instance.is_none() {
            self.report(
                codes::NAMESPACE_NOT_FOUND,
                format!("The type '{name}' is not available to scripts"),
                name.span,
            );
        }
        instance
    }
}

enum OperandTypes {
    Same(TypeId),
    Each(TypeId, TypeId),
}

/// Type of an integer literal: the first of its suffix's candidate types
/// that can hold the value.
fn integer_literal_kind(value: u64, suffix: IntSuffix) -> NumericKind {
    let fits_i32 = value <= i32::MAX as u64;
    let fits_u32 = value <= u32::MAX as u64;
    let fits_i64 = value <= i64::MAX as u64;
    match suffix {
        IntSuffix::None if fits_i32 => NumericKind::Int32,
        IntSuffix::None if fits_u32 => NumericKind::UInt32,
        IntSuffix::None | IntSuffix::Long if fits_i64 => NumericKind::Int64,
        IntSuffix::Unsigned if fits_u32 => NumericKind::UInt32,
        _ => NumericKind::UInt64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_expression;
    use crate::testing::{TestHost, test_host};
    use insta::assert_snapshot;

    fn resolver<'rt>(host: &'rt TestHost, imports: &[&str]) -> NameResolver<'rt> {
        let mut resolver = NameResolver::new(&host.runtime);
        for import in imports {
            let ns = host.runtime.namespaces().tree().find(import).unwrap();
            resolver.import_namespace(ns);
        }
        resolver
    }

    fn bind_in(host: &TestHost, resolver: &NameResolver<'_>, source: &str) -> BoundExpr {
        let expr = parse_expression(source).unwrap();
        Binder::new(resolver)
            .with_parameter("colony", host.colony)
            .with_parameter("colonies", host.list_of_colony)
            .bind(&expr)
    }

    /// Bound tree of `source` with `Supremacy.Game` imported.
    fn render(source: &str) -> String {
        let host = test_host();
        let resolver = resolver(&host, &["Supremacy.Game"]);
        let bound = bind_in(&host, &resolver, source);
        assert_eq!(resolver.diagnostics(), vec![], "{source}");
        bound.display(host.runtime.types()).to_string()
    }

    fn error_codes(imports: &[&str], source: &str) -> Vec<u32> {
        let host = test_host();
        let resolver = resolver(&host, imports);
        let bound = bind_in(&host, &resolver, source);
        assert!(bound.is_error(), "{source}");
        resolver.diagnostics().iter().map(|d| d.code).collect()
    }

    #[test]
    fn test_numeric_promotion() {
        assert_snapshot!(render("1 + 2.5"), @r"
        binary + : System.Double
          convert NumericWiden(Int32 -> Double) [ImplicitCast] : System.Double
            literal 1 : System.Int32
          literal 2.5 : System.Double
        ");
    }

    #[test]
    fn test_integer_literal_types() {
        assert_eq!(integer_literal_kind(1, IntSuffix::None), NumericKind::Int32);
        assert_eq!(integer_literal_kind(3_000_000_000, IntSuffix::None), NumericKind::UInt32);
        assert_eq!(integer_literal_kind(5_000_000_000, IntSuffix::None), NumericKind::Int64);
        assert_eq!(integer_literal_kind(u64::MAX, IntSuffix::None), NumericKind::UInt64);
        assert_eq!(integer_literal_kind(1, IntSuffix::Long), NumericKind::Int64);
        assert_eq!(integer_literal_kind(1, IntSuffix::Unsigned), NumericKind::UInt32);
        assert_eq!(integer_literal_kind(1, IntSuffix::UnsignedLong), NumericKind::UInt64);
    }

    #[test]
    fn test_static_overload_selection() {
        assert_snapshot!(render("Math.Max(1, 2)"), @r"
        static-call System.Math.Max(System.Int32, System.Int32) : System.Int32
          literal 1 : System.Int32
          literal 2 : System.Int32
        ");
        assert_snapshot!(render("Math.Max(1, 2.5)"), @r"
        static-call System.Math.Max(System.Double, System.Double) : System.Double
          convert NumericWiden(Int32 -> Double) [ImplicitCast] : System.Double
            literal 1 : System.Int32
          literal 2.5 : System.Double
        ");
        assert_snapshot!(render("Math.PI"), @"static-property System.Math.PI : System.Double");
    }

    #[test]
    fn test_generic_members_are_substituted() {
        assert_snapshot!(render("colonies[0].Morale + 1"), @r"
        binary + : System.Int32
          convert UnwrapExtensible(Identity) [ImplicitCast] : System.Int32
            property Supremacy.Game.Colony.Morale : Quill.Runtime.Extensible<System.Int32>
              call System.Collections.Generic.List<T>.get_Item(System.Int32) : Supremacy.Game.Colony
                parameter colonies : System.Collections.Generic.List<Supremacy.Game.Colony>
                literal 0 : System.Int32
          literal 1 : System.Int32
        ");
        assert_snapshot!(
            render("colonies.Count"),
            @r"
        property System.Collections.Generic.List<T>.Count : System.Int32
          parameter colonies : System.Collections.Generic.List<Supremacy.Game.Colony>
        "
        );
    }

    #[test]
    fn test_extension_methods() {
        assert_snapshot!(render("colonies.First().Name"), @r"
        property Supremacy.Game.Colony.Name : System.String
          extension-call System.Linq.Enumerable.First(System.Collections.Generic.IEnumerable<T>) : Supremacy.Game.Colony
            parameter colonies : System.Collections.Generic.List<Supremacy.Game.Colony>
        ");
        assert_snapshot!(render("colony.GrowthRate()"), @r"
        extension-call Supremacy.Game.ColonyExtensions.GrowthRate(Supremacy.Game.IPopulated) : System.Double
          convert Assignable [ImplicitCast] : Supremacy.Game.IPopulated
            parameter colony : Supremacy.Game.Colony
        ");
    }

    #[test]
    fn test_extension_provider_must_be_visible() {
        // ColonyExtensions lives in Supremacy.Game, which is not imported.
        assert_eq!(error_codes(&[], "colony.GrowthRate()"), vec![codes::MEMBER_NOT_FOUND]);
    }

    #[test]
    fn test_object_operands_are_dynamic() {
        assert_snapshot!(render("colony.Tag.Produce(1)"), @r"
        dynamic invoke-member(Produce, 1) : System.Object
          property Supremacy.Game.Colony.Tag : System.Object
            parameter colony : Supremacy.Game.Colony
          literal 1 : System.Int32
        ");
        assert_snapshot!(render("colony.Tag.Size[0]"), @r"
        dynamic get-index(1) : System.Object
          dynamic get-member(Size) : System.Object
            property Supremacy.Game.Colony.Tag : System.Object
              parameter colony : Supremacy.Game.Colony
          literal 0 : System.Int32
        ");
    }

    #[test]
    fn test_casts() {
        assert_snapshot!(render("(Int32)2.5"), @r"
        convert NumericNarrow(Double -> Int32) [ExplicitCast] : System.Int32
          literal 2.5 : System.Double
        ");
        assert_snapshot!(render("colony.Tag as Colony"), @r"
        convert Downcast [ExplicitTry] : Supremacy.Game.Colony
          property Supremacy.Game.Colony.Tag : System.Object
            parameter colony : Supremacy.Game.Colony
        ");
    }

    #[test]
    fn test_as_value_type_yields_object() {
        let host = test_host();
        let resolver = resolver(&host, &["Supremacy.Game"]);
        let bound = bind_in(&host, &resolver, "colony.Tag.Size as Int32");
        let types = host.runtime.types();
        assert_eq!(bound.ty, types.well_known().object);
        let keys: Vec<String> = bound
            .descriptors()
            .iter()
            .map(|d| d.key().display(types).to_string())
            .collect();
        assert_eq!(
            keys,
            vec!["convert-to-object(System.Int32, ExplicitTry)", "try-get-member(Size)"]
        );
    }

    #[test]
    fn test_as_numeric_narrowing_yields_sentinel() {
        let host = test_host();
        let resolver = resolver(&host, &[]);
        let bound = bind_in(&host, &resolver, "2.5 as Int32");
        assert_eq!(resolver.diagnostics(), vec![]);
        assert_eq!(bound.ty, host.runtime.types().well_known().object);
        let BoundKind::Convert { conversion, .. } = &bound.kind else {
            panic!("expected a conversion, got {bound:?}");
        };
        assert_eq!(conversion.plan, ConversionPlan::Failure(ConversionMode::ExplicitTry));
    }

    #[test]
    fn test_generic_cast_needs_existing_instance() {
        let host = test_host();
        let resolver = resolver(&host, &["System.Collections.Generic"]);
        let bound = bind_in(&host, &resolver, "(List<Int32>)colony.Tag");
        assert!(resolver.diagnostics().is_empty());
        assert_eq!(host.runtime.types().display_name(bound.ty), "System.Collections.Generic.List<System.Int32>");

        assert_eq!(
            error_codes(&["System.Collections.Generic"], "(List<Double>)colony.Tag"),
            vec![codes::NAMESPACE_NOT_FOUND]
        );
    }

    #[test]
    fn test_descriptors_are_shared() {
        let host = test_host();
        let first = {
            let resolver = resolver(&host, &[]);
            bind_in(&host, &resolver, "colony.Tag.Produce(1) + colony.Tag.Produce(2)")
        };
        let second = {
            let resolver = resolver(&host, &[]);
            bind_in(&host, &resolver, "colony.Tag.Produce(3)")
        };
        let first = first.descriptors();
        let second = second.descriptors();
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first[1], &first[2]));
        assert!(Arc::ptr_eq(&first[1], &second[0]));
        assert!(!Arc::ptr_eq(&first[0], &first[1]));
    }

    #[test]
    fn test_host_alias_group() {
        let host = test_host();
        let resolver = resolver(&host, &[]);
        let bound = bind_in(&host, &resolver, "(Game.Colony)colony.Tag");
        assert!(resolver.diagnostics().is_empty());
        assert_eq!(bound.ty, host.colony);

        assert_eq!(error_codes(&[], "Game.Colony"), vec![codes::TYPE_USED_AS_VALUE]);
    }

    #[test]
    fn test_name_errors() {
        assert_eq!(error_codes(&[], "Missing"), vec![codes::NAME_NOT_FOUND]);
        assert_eq!(error_codes(&[], "System"), vec![codes::NAMESPACE_USED_AS_VALUE]);
        assert_eq!(
            error_codes(&["Supremacy.Game"], "Colony"),
            vec![codes::TYPE_USED_AS_VALUE]
        );
        assert_eq!(
            error_codes(&[], "Supremacy.Nowhere"),
            vec![codes::NAMESPACE_MEMBER_NOT_FOUND]
        );
        assert_eq!(
            error_codes(&["Supremacy.Game", "Supremacy.Universe"], "Sector"),
            vec![codes::AMBIGUOUS_REFERENCE]
        );
    }

    #[test]
    fn test_member_and_call_errors() {
        assert_eq!(error_codes(&[], "colony.Missing"), vec![codes::MEMBER_NOT_FOUND]);
        assert_eq!(error_codes(&[], "colony.Name()"), vec![codes::NOT_INVOCABLE]);
        assert_eq!(error_codes(&[], "Math.Max(\"a\")"), vec![codes::NO_MATCHING_OVERLOAD]);
        assert_eq!(error_codes(&[], "Math.Max"), vec![codes::METHOD_GROUP_AS_VALUE]);
        assert_eq!(error_codes(&[], "colony.Name[0]"), vec![codes::CANNOT_INDEX]);
    }

    #[test]
    fn test_operator_and_conversion_errors() {
        assert_eq!(error_codes(&[], "colony - 1"), vec![codes::OPERATOR_NOT_APPLICABLE]);
        assert_eq!(error_codes(&[], "-colony.Name"), vec![codes::UNARY_OPERATOR_NOT_APPLICABLE]);
        assert_eq!(error_codes(&[], "(Int32)\"a\""), vec![codes::CANNOT_CONVERT]);

        let host = test_host();
        let resolver = resolver(&host, &[]);
        bind_in(&host, &resolver, "(Int32)\"a\"");
        assert_snapshot!(
            resolver.diagnostics()[0].to_string(),
            @"ERROR QS0030 at 7..10: Cannot convert type 'System.String' to 'System.Int32'"
        );
    }

    #[test]
    fn test_errors_do_not_cascade() {
        assert_eq!(error_codes(&[], "Missing + 1"), vec![codes::NAME_NOT_FOUND]);
        assert_eq!(
            error_codes(&[], "Math.Max(Missing, colony.Nope).Foo"),
            vec![codes::NAME_NOT_FOUND, codes::MEMBER_NOT_FOUND]
        );
        assert_eq!(error_codes(&[], "(Int32)Missing"), vec![codes::NAME_NOT_FOUND]);
    }
}
