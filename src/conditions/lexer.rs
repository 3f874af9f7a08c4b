//! condition lexer - splits a condition string into tokens
//!
//! the raw tokens come from logos; a thin pass over its stream folds newlines,
//! tracks bracket depth and rejects numbers glued to names. covers Python's
//! tokenizer for the subset the grammar needs: names, int/float literals with
//! `0x`/`0o`/`0b` and `_` separators, quoted and triple-quoted strings with
//! `r`/`u` prefixes, comments and line continuations.

use std::iter::Peekable;
use std::str::Chars;

use logos::Logos;

use super::error::{ConditionError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Name(String),
    Int(i64),
    Float(f64),
    Str(String),
    /// operator or delimiter
    Op(&'static str),
    /// end of a logical line outside brackets
    Newline,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// byte offsets into the source
    pub start: usize,
    pub end: usize,
}

const OPERATORS: &[&str] = &[
    "**", "//", "<<", ">>", "<=", ">=", "==", "!=", ":=", "->", "+", "-", "*", "/", "%", "@", "&",
    "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "=",
];

/// failure raised while logos matches a token
#[derive(Debug, Clone, PartialEq, Default)]
enum LexError {
    /// nothing matches at this position
    #[default]
    InvalidCharacter,
    Malformed(String),
    Unsupported(&'static str),
}

impl LexError {
    fn into_condition_error(self, source: &str, offset: usize) -> ConditionError {
        match self {
            LexError::InvalidCharacter => match source[offset..].chars().next() {
                Some('\\') => ConditionError::bad_syntax(
                    "unexpected character after line continuation character",
                    source,
                ),
                Some(c) => ConditionError::bad_syntax(
                    format!(
                        "invalid character '{}' at column {}",
                        c,
                        column_of(source, offset)
                    ),
                    source,
                ),
                None => ConditionError::bad_syntax("unexpected end of condition", source),
            },
            LexError::Malformed(message) => ConditionError::bad_syntax(message, source),
            LexError::Unsupported(message) => ConditionError::unsupported(message),
        }
    }
}

/// raw token from logos, before newline folding and bracket tracking
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\x0c]+")]
#[logos(skip r"#[^\r\n]*")]
#[logos(skip r"\\(\r\n|\r|\n)")]
enum RawToken {
    #[regex(r"\r\n|\r|\n")]
    Newline,

    #[regex(r"[_\p{XID_Start}]\p{XID_Continue}*")]
    Name,

    #[regex(r"0[xX](_?[0-9a-fA-F])+", |lex| radix_int(lex, 16))]
    #[regex(r"0[oO](_?[0-7])+", |lex| radix_int(lex, 8))]
    #[regex(r"0[bB](_?[01])+", |lex| radix_int(lex, 2))]
    #[regex(r"[0-9](_?[0-9])*", decimal_int)]
    Int(i64),

    #[regex(r"[0-9](_?[0-9])*\.([0-9](_?[0-9])*)?([eE][+-]?[0-9](_?[0-9])*)?", float)]
    #[regex(r"\.[0-9](_?[0-9])*([eE][+-]?[0-9](_?[0-9])*)?", float)]
    #[regex(r"[0-9](_?[0-9])*[eE][+-]?[0-9](_?[0-9])*", float)]
    Float(f64),

    // the callback consumes the body and the closing quotes
    #[regex(r#"([rRuUbBfF]|[rR][bBfF]|[bBfF][rR])?['"]"#, lex_string)]
    Str(String),

    #[token("**")]
    #[token("//")]
    #[token("<<")]
    #[token(">>")]
    #[token("<=")]
    #[token(">=")]
    #[token("==")]
    #[token("!=")]
    #[token(":=")]
    #[token("->")]
    #[token("+")]
    #[token("-")]
    #[token("*")]
    #[token("/")]
    #[token("%")]
    #[token("@")]
    #[token("&")]
    #[token("|")]
    #[token("^")]
    #[token("~")]
    #[token("<")]
    #[token(">")]
    #[token("(")]
    #[token(")")]
    #[token("[")]
    #[token("]")]
    #[token("{")]
    #[token("}")]
    #[token(",")]
    #[token(":")]
    #[token(".")]
    #[token(";")]
    #[token("=")]
    Op,
}

fn column_of(source: &str, offset: usize) -> usize {
    source[..offset].chars().count() + 1
}

fn radix_int(lex: &mut logos::Lexer<RawToken>, radix: u32) -> std::result::Result<i64, LexError> {
    let digits = lex.slice()[2..].replace('_', "");
    i64::from_str_radix(&digits, radix)
        .map_err(|_| LexError::Malformed("integer literal too large".to_string()))
}

fn decimal_int(lex: &mut logos::Lexer<RawToken>) -> std::result::Result<i64, LexError> {
    let digits = lex.slice().replace('_', "");
    if digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
        return Err(LexError::Malformed(
            "leading zeros in decimal integer literals are not permitted".to_string(),
        ));
    }
    digits
        .parse()
        .map_err(|_| LexError::Malformed("integer literal too large".to_string()))
}

fn float(lex: &mut logos::Lexer<RawToken>) -> std::result::Result<f64, LexError> {
    lex.slice()
        .replace('_', "")
        .parse()
        .map_err(|_| LexError::Malformed(format!("invalid float literal '{}'", lex.slice())))
}

fn lex_string(lex: &mut logos::Lexer<RawToken>) -> std::result::Result<String, LexError> {
    let opening = lex.slice();
    let (prefix, quote) = opening.split_at(opening.len() - 1);
    let prefix = prefix.to_ascii_lowercase();
    if prefix.contains('f') {
        return Err(LexError::Unsupported("f-strings are not supported"));
    }
    if prefix.contains('b') {
        return Err(LexError::Unsupported("bytes literals are not supported"));
    }
    let raw = prefix == "r";
    let open_column = column_of(lex.source(), lex.span().end - 1);

    // the opening quote is already in the slice
    let remainder = lex.remainder();
    let delimiter = if remainder.starts_with(&quote.repeat(2)) {
        quote.repeat(3)
    } else {
        quote.to_string()
    };
    let skipped = delimiter.len() - 1;
    let triple = skipped > 0;
    let body = &remainder[skipped..];

    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            // a backslash protects the next character, even in raw strings
            '\\' => {
                if let Some((_, '\r')) = chars.next() {
                    chars.next_if(|(_, n)| *n == '\n');
                }
            }
            '\n' | '\r' if !triple => break,
            _ if body[i..].starts_with(delimiter.as_str()) => {
                let text = &body[..i];
                let value = if raw {
                    text.to_string()
                } else {
                    unescape(text)?
                };
                lex.bump(skipped + i + delimiter.len());
                return Ok(value);
            }
            _ => {}
        }
    }

    Err(LexError::Malformed(format!(
        "unterminated string literal (opened at column {})",
        open_column
    )))
}

fn unescape(text: &str) -> std::result::Result<String, LexError> {
    let mut value = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            break;
        };
        match escape {
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            '\\' | '\'' | '"' => value.push(escape),
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'a' => value.push('\x07'),
            'b' => value.push('\x08'),
            'f' => value.push('\x0c'),
            'v' => value.push('\x0b'),
            '0'..='7' => {
                let mut code = escape.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                value.push(code_point(code)?);
            }
            'x' => value.push(hex_escape(&mut chars, 'x', 2)?),
            'u' => value.push(hex_escape(&mut chars, 'u', 4)?),
            'U' => value.push(hex_escape(&mut chars, 'U', 8)?),
            'N' => {
                return Err(LexError::Malformed(
                    "named unicode escapes are not supported".to_string(),
                ))
            }
            // unknown escapes are kept verbatim
            other => {
                value.push('\\');
                value.push(other);
            }
        }
    }
    Ok(value)
}

fn hex_escape(
    chars: &mut Peekable<Chars<'_>>,
    letter: char,
    len: usize,
) -> std::result::Result<char, LexError> {
    let mut code = 0u32;
    for _ in 0..len {
        let digit = chars
            .peek()
            .and_then(|d| d.to_digit(16))
            .ok_or_else(|| LexError::Malformed(format!("truncated \\{} escape", letter)))?;
        code = code * 16 + digit;
        chars.next();
    }
    code_point(code)
}

fn code_point(code: u32) -> std::result::Result<char, LexError> {
    char::from_u32(code)
        .ok_or_else(|| LexError::Malformed(format!("invalid code point {:#x}", code)))
}

/// the first line carrying a token must not be indented
fn check_leading_indent(source: &str) -> Result<()> {
    for line in source.split(|c: char| c == '\n' || c == '\r') {
        let code = line.trim_start_matches(&[' ', '\t', '\x0c'][..]);
        // blank or comment-only lines are skipped
        if code.is_empty() || code.starts_with('#') {
            continue;
        }
        if code.len() < line.len() {
            return Err(ConditionError::bad_syntax("unexpected indent", source));
        }
        return Ok(());
    }
    Ok(())
}

pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    check_leading_indent(source)?;

    let mut tokens: Vec<Token> = Vec::new();
    let mut depth = 0usize;
    let mut lexer = RawToken::lexer(source);

    while let Some(raw) = lexer.next() {
        let span = lexer.span();
        let raw = raw.map_err(|e| e.into_condition_error(source, span.start))?;

        let kind = match raw {
            RawToken::Newline => {
                let folded = depth > 0
                    || matches!(
                        tokens.last(),
                        None | Some(Token {
                            kind: TokenKind::Newline,
                            ..
                        })
                    );
                if folded {
                    continue;
                }
                TokenKind::Newline
            }
            RawToken::Name => {
                let glued = matches!(
                    tokens.last(),
                    Some(Token { kind: TokenKind::Int(_) | TokenKind::Float(_), end, .. })
                        if *end == span.start
                );
                if glued {
                    return Err(ConditionError::bad_syntax(
                        format!(
                            "invalid decimal literal at column {}",
                            column_of(source, span.start)
                        ),
                        source,
                    ));
                }
                TokenKind::Name(lexer.slice().to_string())
            }
            RawToken::Int(value) => TokenKind::Int(value),
            RawToken::Float(value) => TokenKind::Float(value),
            RawToken::Str(value) => TokenKind::Str(value),
            RawToken::Op => {
                let op = OPERATORS
                    .iter()
                    .copied()
                    .find(|op| *op == lexer.slice())
                    .ok_or_else(|| {
                        LexError::InvalidCharacter.into_condition_error(source, span.start)
                    })?;
                match op {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => {
                        if depth == 0 {
                            return Err(ConditionError::bad_syntax(
                                format!(
                                    "unmatched '{}' at column {}",
                                    op,
                                    column_of(source, span.start)
                                ),
                                source,
                            ));
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
                TokenKind::Op(op)
            }
        };

        tokens.push(Token {
            kind,
            start: span.start,
            end: span.end,
        });
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        start: end,
        end,
    });
    Ok(tokens)
}
