//! Bound expressions: the syntax tree with every name, member and
//! conversion resolved against host metadata.

use std::fmt;
use std::sync::Arc;

use quill_core::{MethodId, Span, TypeId, TypeTable};
use quill_runtime::{BinaryOperator, Conversion, DispatchDescriptor, UnaryOperator};

use crate::syntax::Literal;

#[derive(Clone, Debug)]
pub struct BoundExpr {
    pub kind: BoundKind,
    pub ty: TypeId,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub enum BoundKind {
    Literal(Literal),
    Parameter(String),
    Convert {
        operand: Box<BoundExpr>,
        conversion: Conversion,
        descriptor: Arc<DispatchDescriptor>,
        checked: bool,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<BoundExpr>,
        descriptor: Arc<DispatchDescriptor>,
        checked: bool,
    },
    Binary {
        op: BinaryOperator,
        left: Box<BoundExpr>,
        right: Box<BoundExpr>,
        descriptor: Arc<DispatchDescriptor>,
        checked: bool,
    },
    /// Property read; `target` is `None` for static properties.
    Property {
        target: Option<Box<BoundExpr>>,
        declaring: TypeId,
        name: String,
    },
    /// Static or instance method call; `target` is `None` for static calls.
    Call {
        target: Option<Box<BoundExpr>>,
        method: MethodId,
        args: Vec<BoundExpr>,
    },
    /// Extension method call; the receiver is the first argument.
    ExtensionCall {
        method: MethodId,
        args: Vec<BoundExpr>,
    },
    /// Operation on an `Object` operand, dispatched at run time through a
    /// shared descriptor: get-member, invoke-member, invoke or get-index.
    Dynamic {
        descriptor: Arc<DispatchDescriptor>,
        operands: Vec<BoundExpr>,
    },
    /// Placeholder for an expression that failed to bind. Its error has
    /// already been reported.
    Error,
}

impl BoundExpr {
    pub fn new(kind: BoundKind, ty: TypeId, span: Span) -> Self {
        Self { kind, ty, span }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, BoundKind::Error)
    }

    pub fn children(&self) -> Vec<&BoundExpr> {
        match &self.kind {
            BoundKind::Literal(_) | BoundKind::Parameter(_) | BoundKind::Error => Vec::new(),
            BoundKind::Convert { operand, .. } | BoundKind::Unary { operand, .. } => {
                vec![operand.as_ref()]
            }
            BoundKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            BoundKind::Property { target, .. } => target.iter().map(|t| t.as_ref()).collect(),
            BoundKind::Call { target, args, .. } => target
                .iter()
                .map(|t| t.as_ref())
                .chain(args.iter())
                .collect(),
            BoundKind::ExtensionCall { args, .. } => args.iter().collect(),
            BoundKind::Dynamic { operands, .. } => operands.iter().collect(),
        }
    }

    /// Dispatch descriptors referenced anywhere in the tree, in pre-order.
    pub fn descriptors(&self) -> Vec<Arc<DispatchDescriptor>> {
        let mut found = Vec::new();
        self.collect_descriptors(&mut found);
        found
    }

    fn collect_descriptors(&self, found: &mut Vec<Arc<DispatchDescriptor>>) {
        match &self.kind {
            BoundKind::Convert { descriptor, .. }
            | BoundKind::Unary { descriptor, .. }
            | BoundKind::Binary { descriptor, .. }
            | BoundKind::Dynamic { descriptor, .. } => found.push(Arc::clone(descriptor)),
            _ => {}
        }
        for child in self.children() {
            child.collect_descriptors(found);
        }
    }

    pub fn display<'a>(&'a self, types: &'a TypeTable) -> BoundDisplay<'a> {
        BoundDisplay { expr: self, types }
    }
}

/// Indented one-node-per-line rendering of a bound tree.
pub struct BoundDisplay<'a> {
    expr: &'a BoundExpr,
    types: &'a TypeTable,
}

impl BoundDisplay<'_> {
    fn write_node(&self, f: &mut fmt::Formatter<'_>, expr: &BoundExpr, depth: usize) -> fmt::Result {
        let types = self.types;
        write!(f, "{:indent$}", "", indent = depth * 2)?;
        match &expr.kind {
            BoundKind::Literal(literal) => write!(f, "literal {literal}")?,
            BoundKind::Parameter(name) => write!(f, "parameter {name}")?,
            BoundKind::Convert {
                conversion,
                checked,
                ..
            } => {
                write!(f, "convert {} [{}]", conversion.plan.display(types), conversion.mode)?;
                if *checked {
                    f.write_str(" checked")?;
                }
            }
            BoundKind::Unary { op, checked, .. } => {
                write!(f, "unary {op}")?;
                if *checked {
                    f.write_str(" checked")?;
                }
            }
            BoundKind::Binary { op, checked, .. } => {
                write!(f, "binary {op}")?;
                if *checked {
                    f.write_str(" checked")?;
                }
            }
            BoundKind::Property {
                target,
                declaring,
                name,
            } => {
                let kind = if target.is_some() { "property" } else { "static-property" };
                write!(f, "{kind} {}.{name}", types.display_name(*declaring))?;
            }
            BoundKind::Call { target, method, .. } => {
                let kind = if target.is_some() { "call" } else { "static-call" };
                write!(f, "{kind} {}", types.method_signature(*method))?;
            }
            BoundKind::ExtensionCall { method, .. } => {
                write!(f, "extension-call {}", types.method_signature(*method))?;
            }
            BoundKind::Dynamic { descriptor, .. } => {
                write!(f, "dynamic {}", descriptor.key().display(types))?;
            }
            BoundKind::Error => f.write_str("error")?,
        }
        write!(f, " : {}", types.display_name(expr.ty))?;
        for child in expr.children() {
            f.write_str("\n")?;
            self.write_node(f, child, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for BoundDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, self.expr, 0)
    }
}
