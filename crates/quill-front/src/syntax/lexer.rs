//! Tokenizer for script source text.

use quill_core::Span;
use winnow::combinator::{alt, opt};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{any, one_of, take_while};

use super::SyntaxError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int { value: u64, suffix: IntSuffix },
    Real { value: f64, suffix: RealSuffix },
    Str(String),

    Using,
    True,
    False,
    Null,
    As,
    Checked,
    Unchecked,

    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Question,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AndAnd,
    OrOr,

    Eof,
}

/// Integer literal suffix (`L`, `U`, `UL`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntSuffix {
    None,
    Long,
    Unsigned,
    UnsignedLong,
}

/// Real literal suffix (`f`, `d`, `m`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RealSuffix {
    None,
    Float,
    Double,
    Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl TokenKind {
    /// Text used in "expected X, found Y" messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{name}'"),
            TokenKind::Int { .. } | TokenKind::Real { .. } => "number".to_owned(),
            TokenKind::Str(_) => "string literal".to_owned(),
            TokenKind::Eof => "end of input".to_owned(),
            other => format!("'{}'", other.punctuation()),
        }
    }

    fn punctuation(&self) -> &'static str {
        match self {
            TokenKind::Using => "using",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::As => "as",
            TokenKind::Checked => "checked",
            TokenKind::Unchecked => "unchecked",
            TokenKind::Dot => ".",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Question => "?",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::AndAnd => "&&",
            TokenKind::OrOr => "||",
            TokenKind::Ident(_)
            | TokenKind::Int { .. }
            | TokenKind::Real { .. }
            | TokenKind::Str(_)
            | TokenKind::Eof => "",
        }
    }
}

/// Split `source` into tokens. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut input = source;
    let mut tokens = Vec::new();
    loop {
        trivia
            .parse_next(&mut input)
            .map_err(|_| error_at(source, input, "unterminated comment"))?;
        let start = source.len() - input.len();
        if input.is_empty() {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
            return Ok(tokens);
        }
        let kind = token.parse_next(&mut input).map_err(|_| {
            let rest = &source[start..];
            match rest.chars().next() {
                Some('"') => error_at(source, rest, "unterminated string literal"),
                Some(c) if c.is_ascii_digit() => error_at(source, rest, "malformed number"),
                Some(c) => error_at(source, rest, &format!("unexpected character '{c}'")),
                None => error_at(source, rest, "unexpected end of input"),
            }
        })?;
        let end = source.len() - input.len();
        tokens.push(Token {
            kind,
            span: Span::new(start, end),
        });
    }
}

fn error_at(source: &str, rest: &str, message: &str) -> SyntaxError {
    let offset = source.len() - rest.len();
    let width = rest.chars().next().map_or(0, char::len_utf8);
    SyntaxError {
        message: message.to_owned(),
        span: Span::new(offset, offset + width),
    }
}

/// Whitespace and comments.
fn trivia(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_whitespace()).parse_next(input)?;
        if input.starts_with("//") {
            take_while(0.., |c: char| c != '\n').parse_next(input)?;
        } else if input.starts_with("/*") {
            let rest: &str = *input;
            let Some(end) = rest[2..].find("*/") else {
                return Err(ErrMode::Cut(ContextError::new()));
            };
            *input = &rest[end + 4..];
        } else {
            return Ok(());
        }
    }
}

fn token(input: &mut &str) -> ModalResult<TokenKind> {
    alt((number, string_lit.map(TokenKind::Str), word, operator)).parse_next(input)
}

fn word(input: &mut &str) -> ModalResult<TokenKind> {
    let text = (
        one_of(|c: char| c.is_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)?;
    Ok(match text {
        "using" => TokenKind::Using,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        "as" => TokenKind::As,
        "checked" => TokenKind::Checked,
        "unchecked" => TokenKind::Unchecked,
        _ => TokenKind::Ident(text.to_owned()),
    })
}

fn operator(input: &mut &str) -> ModalResult<TokenKind> {
    alt((
        alt((
            "==".value(TokenKind::EqEq),
            "!=".value(TokenKind::NotEq),
            "<=".value(TokenKind::LtEq),
            ">=".value(TokenKind::GtEq),
            "&&".value(TokenKind::AndAnd),
            "||".value(TokenKind::OrOr),
        )),
        alt((
            '.'.value(TokenKind::Dot),
            ','.value(TokenKind::Comma),
            ';'.value(TokenKind::Semicolon),
            '('.value(TokenKind::LParen),
            ')'.value(TokenKind::RParen),
            '['.value(TokenKind::LBracket),
            ']'.value(TokenKind::RBracket),
            '?'.value(TokenKind::Question),
            '='.value(TokenKind::Assign),
            '+'.value(TokenKind::Plus),
            '-'.value(TokenKind::Minus),
            '*'.value(TokenKind::Star),
            '/'.value(TokenKind::Slash),
            '%'.value(TokenKind::Percent),
            '!'.value(TokenKind::Bang),
            '<'.value(TokenKind::Lt),
            '>'.value(TokenKind::Gt),
        )),
    ))
    .parse_next(input)
}

/// Decimal integer or real literal with an optional type suffix.
fn number(input: &mut &str) -> ModalResult<TokenKind> {
    let digits = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    // `1.Foo` is a member access on an integer, not a real literal.
    let fraction = if input.starts_with('.')
        && input[1..].starts_with(|c: char| c.is_ascii_digit())
    {
        Some(('.', take_while(1.., |c: char| c.is_ascii_digit())).take().parse_next(input)?)
    } else {
        None
    };
    let exponent = opt((
        one_of(['e', 'E']),
        opt(one_of(['+', '-'])),
        take_while(1.., |c: char| c.is_ascii_digit()),
    ))
    .take()
    .parse_next(input)?;
    let real_suffix = opt(one_of(['f', 'F', 'd', 'D', 'm', 'M'])).parse_next(input)?;

    if fraction.is_some() || !exponent.is_empty() || real_suffix.is_some() {
        let text = format!("{digits}{}{exponent}", fraction.unwrap_or(""));
        let value = text.parse::<f64>().map_err(|_| backtrack())?;
        let suffix = match real_suffix {
            Some('f' | 'F') => RealSuffix::Float,
            Some('d' | 'D') => RealSuffix::Double,
            Some('m' | 'M') => RealSuffix::Decimal,
            _ => RealSuffix::None,
        };
        reject_word_tail(input)?;
        return Ok(TokenKind::Real { value, suffix });
    }

    let value = digits.parse::<u64>().map_err(|_| backtrack())?;
    let suffix = int_suffix.parse_next(input)?;
    reject_word_tail(input)?;
    Ok(TokenKind::Int { value, suffix })
}

fn int_suffix(input: &mut &str) -> ModalResult<IntSuffix> {
    let unsigned = opt(one_of(['u', 'U'])).parse_next(input)?.is_some();
    let long = opt(one_of(['l', 'L'])).parse_next(input)?.is_some();
    let unsigned = unsigned || (long && opt(one_of(['u', 'U'])).parse_next(input)?.is_some());
    Ok(match (unsigned, long) {
        (false, false) => IntSuffix::None,
        (false, true) => IntSuffix::Long,
        (true, false) => IntSuffix::Unsigned,
        (true, true) => IntSuffix::UnsignedLong,
    })
}

/// `12abc` is one malformed token, not a number followed by a name.
fn reject_word_tail(input: &mut &str) -> ModalResult<()> {
    if input.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
        return Err(backtrack());
    }
    Ok(())
}

fn string_lit(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut result = String::new();
    loop {
        match any.parse_next(input)? {
            '"' => break,
            '\n' => return Err(backtrack()),
            '\\' => match any.parse_next(input)? {
                '"' => result.push('"'),
                '\\' => result.push('\\'),
                'n' => result.push('\n'),
                't' => result.push('\t'),
                'r' => result.push('\r'),
                '0' => result.push('\0'),
                other => {
                    result.push('\\');
                    result.push(other);
                }
            },
            c => result.push(c),
        }
    }
    Ok(result)
}

fn backtrack() -> ErrMode<ContextError> {
    ErrMode::Backtrack(ContextError::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn test_tokenize_expression() {
        let tokens = tokenize("colony.Population >= 10").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind.clone()).collect::<Vec<_>>(),
            vec![
                TokenKind::Ident("colony".into()),
                TokenKind::Dot,
                TokenKind::Ident("Population".into()),
                TokenKind::GtEq,
                TokenKind::Int {
                    value: 10,
                    suffix: IntSuffix::None
                },
                TokenKind::Eof,
            ]
        );
        assert_eq!(tokens[2].span, Span::new(7, 17));
        assert_eq!(tokens[5].span, Span::new(23, 23));
    }

    #[test]
    fn test_number_suffixes() {
        assert_eq!(
            kinds("3L 4u 5UL 2.5 1f 7m 1e3")[..7],
            [
                TokenKind::Int {
                    value: 3,
                    suffix: IntSuffix::Long
                },
                TokenKind::Int {
                    value: 4,
                    suffix: IntSuffix::Unsigned
                },
                TokenKind::Int {
                    value: 5,
                    suffix: IntSuffix::UnsignedLong
                },
                TokenKind::Real {
                    value: 2.5,
                    suffix: RealSuffix::None
                },
                TokenKind::Real {
                    value: 1.0,
                    suffix: RealSuffix::Float
                },
                TokenKind::Real {
                    value: 7.0,
                    suffix: RealSuffix::Decimal
                },
                TokenKind::Real {
                    value: 1000.0,
                    suffix: RealSuffix::None
                },
            ]
        );
    }

    #[test]
    fn test_member_access_on_integer() {
        assert_eq!(
            kinds("1.ToString"),
            vec![
                TokenKind::Int {
                    value: 1,
                    suffix: IntSuffix::None
                },
                TokenKind::Dot,
                TokenKind::Ident("ToString".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_strings_and_comments() {
        assert_eq!(
            kinds("using /* block */ x // tail\n as \"a\\\"b\" null"),
            vec![
                TokenKind::Using,
                TokenKind::Ident("x".into()),
                TokenKind::As,
                TokenKind::Str("a\"b".into()),
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_errors() {
        let err = tokenize("1 + #").unwrap_err();
        assert_eq!(err.span, Span::new(4, 5));
        insta::assert_snapshot!(err.to_string(), @"unexpected character '#' at 4..5");

        let err = tokenize("\"open").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");

        let err = tokenize("12abc").unwrap_err();
        assert_eq!(err.message, "malformed number");

        let err = tokenize("x /* never closed").unwrap_err();
        assert_eq!(err.message, "unterminated comment");
    }
}
