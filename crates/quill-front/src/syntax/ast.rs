//! Syntax tree of a script.

use std::fmt;

use quill_core::Span;
use quill_runtime::{BinaryOperator, UnaryOperator};

pub use super::lexer::{IntSuffix, RealSuffix};

/// A whole script: its `using` directives followed by one expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Script {
    pub usings: Vec<UsingDirective>,
    pub body: Expr,
}

/// `using Some.Namespace;` or `using Alias = Some.Namespace;`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsingDirective {
    pub alias: Option<Ident>,
    pub path: Vec<Ident>,
    pub span: Span,
}

impl UsingDirective {
    pub fn dotted_path(&self) -> String {
        dotted(&self.path)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Name(Ident),
    Member {
        target: Box<Expr>,
        name: Ident,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `(T) expr`
    Cast {
        ty: TypeName,
        expr: Box<Expr>,
    },
    /// `expr as T`
    As {
        expr: Box<Expr>,
        ty: TypeName,
    },
    /// `checked(expr)` or `unchecked(expr)`
    Checked {
        checked: bool,
        expr: Box<Expr>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int { value: u64, suffix: IntSuffix },
    Real { value: f64, suffix: RealSuffix },
    Str(String),
    Bool(bool),
    Null,
}

/// A type as written in a cast or after `as`: `Int32`, `System.Double?`,
/// `List<Colony>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeName {
    pub path: Vec<Ident>,
    pub arguments: Vec<TypeName>,
    pub nullable: bool,
    pub span: Span,
}

fn dotted(path: &[Ident]) -> String {
    path.iter()
        .map(|ident| ident.name.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&dotted(&self.path))?;
        if !self.arguments.is_empty() {
            f.write_str("<")?;
            for (i, argument) in self.arguments.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{argument}")?;
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int { value, suffix } => {
                let suffix = match suffix {
                    IntSuffix::None => "",
                    IntSuffix::Long => "L",
                    IntSuffix::Unsigned => "U",
                    IntSuffix::UnsignedLong => "UL",
                };
                write!(f, "{value}{suffix}")
            }
            Literal::Real { value, suffix } => {
                let suffix = match suffix {
                    RealSuffix::None => "",
                    RealSuffix::Float => "f",
                    RealSuffix::Double => "d",
                    RealSuffix::Decimal => "m",
                };
                write!(f, "{value:?}{suffix}")
            }
            Literal::Str(text) => write!(f, "{text:?}"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Null => f.write_str("null"),
        }
    }
}

/// Fully parenthesized rendering, used by tests and `--show-ast`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            Ok(())
        }

        match &self.kind {
            ExprKind::Literal(literal) => write!(f, "{literal}"),
            ExprKind::Name(ident) => f.write_str(&ident.name),
            ExprKind::Member { target, name } => write!(f, "{target}.{}", name.name),
            ExprKind::Call { callee, args } => {
                write!(f, "{callee}(")?;
                list(f, args)?;
                f.write_str(")")
            }
            ExprKind::Index { target, args } => {
                write!(f, "{target}[")?;
                list(f, args)?;
                f.write_str("]")
            }
            ExprKind::Unary { op, operand } => write!(f, "({op}{operand})"),
            ExprKind::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            ExprKind::Cast { ty, expr } => write!(f, "(({ty}) {expr})"),
            ExprKind::As { expr, ty } => write!(f, "({expr} as {ty})"),
            ExprKind::Checked { checked, expr } => {
                let keyword = if *checked { "checked" } else { "unchecked" };
                write!(f, "{keyword}({expr})")
            }
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for using in &self.usings {
            match &using.alias {
                Some(alias) => writeln!(f, "using {} = {};", alias.name, using.dotted_path())?,
                None => writeln!(f, "using {};", using.dotted_path())?,
            }
        }
        write!(f, "{}", self.body)
    }
}
