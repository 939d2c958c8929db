//! Script syntax: tokens, syntax tree and parser.

pub mod ast;
pub mod lexer;
pub mod parser;

use derive_more::{Display, Error};
use quill_core::diagnostic::codes;
use quill_core::{CompilationPhase, Diagnostic, Span};

pub use ast::{Expr, ExprKind, Ident, Literal, Script, TypeName, UsingDirective};
pub use parser::Parser;

/// A lexical or grammatical error.
#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[display("{message} at {span}")]
pub struct SyntaxError {
    pub message: String,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(
            codes::SYNTAX_ERROR,
            self.message.clone(),
            self.span,
            CompilationPhase::Parsing,
        )
    }
}

pub fn parse_script(source: &str) -> Result<Script, SyntaxError> {
    Parser::new(lexer::tokenize(source)?).parse_script()
}

/// Parse a lone expression, with no `using` directives.
pub fn parse_expression(source: &str) -> Result<Expr, SyntaxError> {
    Parser::new(lexer::tokenize(source)?).parse_expression()
}
