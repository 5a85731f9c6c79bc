//! Tokenizer for binding expressions.
//!
//! Produces a flat token list terminated by [`TokenKind::Eof`]. Keywords
//! (`true`, `typeof`, ...) are emitted as identifiers and recognized by the
//! parser.

use crate::error::EvalError;

/// Operator and delimiter tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Semicolon,
    Question,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    String(String),
    Ident(String),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token's first character.
    pub offset: usize,
}

/// Operators ordered so that longer spellings are tried first.
const OPERATORS: &[(&str, Punct)] = &[
    ("===", Punct::StrictEq),
    ("!==", Punct::StrictNotEq),
    ("==", Punct::Eq),
    ("!=", Punct::NotEq),
    ("<=", Punct::Le),
    (">=", Punct::Ge),
    ("&&", Punct::AndAnd),
    ("||", Punct::OrOr),
    ("+=", Punct::PlusAssign),
    ("-=", Punct::MinusAssign),
    ("*=", Punct::StarAssign),
    ("/=", Punct::SlashAssign),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    ("{", Punct::LBrace),
    ("}", Punct::RBrace),
    (",", Punct::Comma),
    (".", Punct::Dot),
    (":", Punct::Colon),
    (";", Punct::Semicolon),
    ("?", Punct::Question),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("!", Punct::Bang),
    ("=", Punct::Assign),
    ("<", Punct::Lt),
    (">", Punct::Gt),
];

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Split `source` into tokens.
///
/// # Errors
///
/// Returns [`EvalError::Syntax`] on unterminated strings, malformed numbers,
/// and characters outside the grammar.
pub fn tokenize(source: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while let Some(c) = source[offset..].chars().next() {
        let rest = &source[offset..];
        if c.is_whitespace() {
            offset += c.len_utf8();
        } else if c.is_ascii_digit()
            || (c == '.' && rest[1..].starts_with(|d: char| d.is_ascii_digit()))
        {
            let (value, len) = lex_number(rest, offset)?;
            tokens.push(Token {
                kind: TokenKind::Number(value),
                offset,
            });
            offset += len;
        } else if c == '"' || c == '\'' {
            let (value, len) = lex_string(rest, offset)?;
            tokens.push(Token {
                kind: TokenKind::String(value),
                offset,
            });
            offset += len;
        } else if is_ident_start(c) {
            let len = rest
                .find(|ch: char| !is_ident_continue(ch))
                .unwrap_or(rest.len());
            tokens.push(Token {
                kind: TokenKind::Ident(rest[..len].to_owned()),
                offset,
            });
            offset += len;
        } else if let Some(&(spelling, punct)) =
            OPERATORS.iter().find(|(spelling, _)| rest.starts_with(spelling))
        {
            tokens.push(Token {
                kind: TokenKind::Punct(punct),
                offset,
            });
            offset += spelling.len();
        } else {
            return Err(EvalError::syntax(offset, format!("unexpected character '{c}'")));
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

fn lex_number(rest: &str, offset: usize) -> Result<(f64, usize), EvalError> {
    let bytes = rest.as_bytes();
    let mut len = 0;
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    len += digits(len);
    if bytes.get(len) == Some(&b'.') {
        len += 1;
        len += digits(len);
    }
    if matches!(bytes.get(len), Some(b'e' | b'E')) {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits == 0 {
            return Err(EvalError::syntax(offset + len, "malformed exponent"));
        }
        len = exp + exp_digits;
    }
    if bytes.get(len).is_some_and(|b| b.is_ascii_alphabetic() || *b == b'_') {
        return Err(EvalError::syntax(offset + len, "identifier directly after number"));
    }

    rest[..len]
        .parse::<f64>()
        .map(|value| (value, len))
        .map_err(|_| EvalError::syntax(offset, "malformed number"))
}

fn lex_string(rest: &str, offset: usize) -> Result<(String, usize), EvalError> {
    let mut chars = rest.char_indices();
    let Some((_, quote)) = chars.next() else {
        return Err(EvalError::syntax(offset, "expected string"));
    };
    let mut value = String::new();

    while let Some((index, c)) = chars.next() {
        match c {
            _ if c == quote => return Ok((value, index + c.len_utf8())),
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    break;
                };
                value.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                });
            }
            '\n' => break,
            _ => value.push(c),
        }
    }

    Err(EvalError::syntax(offset, "unterminated string literal"))
}
