//! Recursive descent parser with precedence climbing for binary operators.

use quill_core::Span;
use quill_runtime::{BinaryOperator, UnaryOperator};

use super::SyntaxError;
use super::ast::{Expr, ExprKind, Ident, Literal, Script, TypeName, UsingDirective};
use super::lexer::{Token, TokenKind};

/// Precedence of `as`, which binds like a relational operator.
const AS_PRECEDENCE: u8 = 4;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// `tokens` must end with [`TokenKind::Eof`].
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse_script(&mut self) -> Result<Script, SyntaxError> {
        let mut usings = Vec::new();
        while self.peek() == &TokenKind::Using {
            usings.push(self.using_directive()?);
        }
        let body = self.expression()?;
        self.expect_eof()?;
        Ok(Script { usings, body })
    }

    pub fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let expr = self.expression()?;
        self.expect_eof()?;
        Ok(expr)
    }

    fn using_directive(&mut self) -> Result<UsingDirective, SyntaxError> {
        let start = self.bump().span;
        let first = self.ident()?;
        let (alias, path) = if self.eat(&TokenKind::Assign) {
            (Some(first), self.dotted_path(None)?)
        } else {
            (None, self.dotted_path(Some(first))?)
        };
        let end = self.expect(&TokenKind::Semicolon)?;
        Ok(UsingDirective {
            alias,
            path,
            span: start.to(end),
        })
    }

    fn dotted_path(&mut self, first: Option<Ident>) -> Result<Vec<Ident>, SyntaxError> {
        let mut path = vec![match first {
            Some(ident) => ident,
            None => self.ident()?,
        }];
        while self.eat(&TokenKind::Dot) {
            path.push(self.ident()?);
        }
        Ok(path)
    }

    fn expression(&mut self) -> Result<Expr, SyntaxError> {
        self.binary(1)
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.unary()?;
        loop {
            if self.peek() == &TokenKind::As && AS_PRECEDENCE >= min_precedence {
                self.bump();
                let ty = self.type_name()?;
                let span = left.span.to(ty.span);
                left = Expr {
                    kind: ExprKind::As {
                        expr: Box::new(left),
                        ty,
                    },
                    span,
                };
                continue;
            }
            let Some(op) = binary_operator(self.peek()) else {
                break;
            };
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.bump();
            let right = self.binary(precedence + 1)?;
            let span = left.span.to(right.span);
            left = Expr {
                kind: ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            };
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOperator::Negate),
            TokenKind::Plus => Some(UnaryOperator::Plus),
            TokenKind::Bang => Some(UnaryOperator::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.bump().span;
            let operand = self.unary()?;
            let span = start.to(operand.span);
            return Ok(Expr {
                kind: ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            });
        }
        if let Some((ty, prefix)) = self.try_cast_prefix() {
            let expr = self.unary()?;
            let span = prefix.to(expr.span);
            return Ok(Expr {
                kind: ExprKind::Cast {
                    ty,
                    expr: Box::new(expr),
                },
                span,
            });
        }
        self.postfix()
    }

    /// `(TypeName)` followed by something that can only start an operand.
    /// Returns the type and the span of the parenthesized prefix.
    fn try_cast_prefix(&mut self) -> Option<(TypeName, Span)> {
        if self.peek() != &TokenKind::LParen {
            return None;
        }
        let checkpoint = self.pos;
        let start = self.bump().span;
        if let Ok(ty) = self.type_name()
            && self.peek() == &TokenKind::RParen
            && starts_cast_operand(self.peek_at(1))
        {
            let end = self.bump().span;
            return Some((ty, start.to(end)));
        }
        self.pos = checkpoint;
        None
    }

    fn postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.bump();
                    let name = self.ident()?;
                    let span = expr.span.to(name.span);
                    expr = Expr {
                        kind: ExprKind::Member {
                            target: Box::new(expr),
                            name,
                        },
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.bump();
                    let (args, end) = self.arguments(&TokenKind::RParen)?;
                    let span = expr.span.to(end);
                    expr = Expr {
                        kind: ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.bump();
                    let (args, end) = self.arguments(&TokenKind::RBracket)?;
                    if args.is_empty() {
                        return Err(SyntaxError::new("expected an index expression", end));
                    }
                    let span = expr.span.to(end);
                    expr = Expr {
                        kind: ExprKind::Index {
                            target: Box::new(expr),
                            args,
                        },
                        span,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Comma-separated expressions up to `close`, which is consumed.
    fn arguments(&mut self, close: &TokenKind) -> Result<(Vec<Expr>, Span), SyntaxError> {
        let mut args = Vec::new();
        if self.peek() != close {
            loop {
                args.push(self.expression()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.expect(close)?;
        Ok((args, end))
    }

    fn primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.bump();
        let literal = |literal| Expr {
            kind: ExprKind::Literal(literal),
            span: token.span,
        };
        match token.kind {
            TokenKind::Int { value, suffix } => Ok(literal(Literal::Int { value, suffix })),
            TokenKind::Real { value, suffix } => Ok(literal(Literal::Real { value, suffix })),
            TokenKind::Str(ref text) => Ok(literal(Literal::Str(text.clone()))),
            TokenKind::True => Ok(literal(Literal::Bool(true))),
            TokenKind::False => Ok(literal(Literal::Bool(false))),
            TokenKind::Null => Ok(literal(Literal::Null)),
            TokenKind::Ident(ref name) => Ok(Expr {
                kind: ExprKind::Name(Ident {
                    name: name.clone(),
                    span: token.span,
                }),
                span: token.span,
            }),
            TokenKind::LParen => {
                let inner = self.expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                Ok(Expr {
                    kind: inner.kind,
                    span: token.span.to(end),
                })
            }
            TokenKind::Checked | TokenKind::Unchecked => {
                let checked = token.kind == TokenKind::Checked;
                self.expect(&TokenKind::LParen)?;
                let inner = self.expression()?;
                let end = self.expect(&TokenKind::RParen)?;
                Ok(Expr {
                    kind: ExprKind::Checked {
                        checked,
                        expr: Box::new(inner),
                    },
                    span: token.span.to(end),
                })
            }
            ref other => Err(SyntaxError::new(
                format!("expected expression, found {}", other.describe()),
                token.span,
            )),
        }
    }

    fn type_name(&mut self) -> Result<TypeName, SyntaxError> {
        let path = self.dotted_path(None)?;
        let start = path[0].span;
        let mut end = path[path.len() - 1].span;
        let mut arguments = Vec::new();
        if self.eat(&TokenKind::Lt) {
            loop {
                arguments.push(self.type_name()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            end = self.expect(&TokenKind::Gt)?;
        }
        let nullable = self.peek() == &TokenKind::Question;
        if nullable {
            end = self.bump().span;
        }
        Ok(TypeName {
            path,
            arguments,
            nullable,
            span: start.to(end),
        })
    }

    fn ident(&mut self) -> Result<Ident, SyntaxError> {
        let token = self.bump();
        match token.kind {
            TokenKind::Ident(name) => Ok(Ident {
                name,
                span: token.span,
            }),
            other => Err(SyntaxError::new(
                format!("expected identifier, found {}", other.describe()),
                token.span,
            )),
        }
    }

    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    /// Consume the current token. `Eof` is never consumed.
    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Span, SyntaxError> {
        if self.peek() == kind {
            return Ok(self.bump().span);
        }
        let found = &self.tokens[self.pos];
        Err(SyntaxError::new(
            format!("expected {}, found {}", kind.describe(), found.kind.describe()),
            found.span,
        ))
    }

    fn expect_eof(&mut self) -> Result<(), SyntaxError> {
        self.expect(&TokenKind::Eof).map(|_| ())
    }
}

fn binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    Some(match kind {
        TokenKind::Plus => BinaryOperator::Add,
        TokenKind::Minus => BinaryOperator::Subtract,
        TokenKind::Star => BinaryOperator::Multiply,
        TokenKind::Slash => BinaryOperator::Divide,
        TokenKind::Percent => BinaryOperator::Modulo,
        TokenKind::EqEq => BinaryOperator::Equal,
        TokenKind::NotEq => BinaryOperator::NotEqual,
        TokenKind::Lt => BinaryOperator::LessThan,
        TokenKind::LtEq => BinaryOperator::LessThanOrEqual,
        TokenKind::Gt => BinaryOperator::GreaterThan,
        TokenKind::GtEq => BinaryOperator::GreaterThanOrEqual,
        TokenKind::AndAnd => BinaryOperator::AndAlso,
        TokenKind::OrOr => BinaryOperator::OrElse,
        _ => return None,
    })
}

/// Tokens after `(T)` that make it a cast rather than a parenthesized
/// expression. `+` and `-` are excluded: `(a) - b` is a subtraction.
fn starts_cast_operand(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Ident(_)
            | TokenKind::Int { .. }
            | TokenKind::Real { .. }
            | TokenKind::Str(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::Null
            | TokenKind::Checked
            | TokenKind::Unchecked
            | TokenKind::LParen
            | TokenKind::Bang
    )
}
