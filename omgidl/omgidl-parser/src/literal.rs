//! Decoding of literal lexemes into values.
//!
//! The lexer calls these to validate literals as it scans; the parser calls
//! them again to build AST literals, so both agree on what is malformed.

use std::num::IntErrorKind;

use omgidl_core::{LiteralKind, ast::Radix};

pub(crate) fn parse_integer(lexeme: &str, kind: LiteralKind) -> Result<(u64, Radix), String> {
    let (digits, radix, base) = match kind {
        LiteralKind::Hex => (&lexeme[2..], Radix::Hex, 16),
        LiteralKind::Octal => (&lexeme[1..], Radix::Octal, 8),
        _ => (lexeme, Radix::Decimal, 10),
    };
    u64::from_str_radix(digits, base)
        .map(|v| (v, radix))
        .map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow => "value does not fit in 64 bits".to_string(),
            _ if radix == Radix::Octal => "invalid digit in octal literal".to_string(),
            _ => "invalid digit".to_string(),
        })
}

pub(crate) fn parse_float(lexeme: &str) -> Result<f64, String> {
    lexeme.parse::<f64>().map_err(|e| e.to_string())
}

/// Fixed-point literals carry a trailing `d`/`D`.
pub(crate) fn parse_fixed(lexeme: &str) -> Result<f64, String> {
    let digits = lexeme.trim_end_matches(['d', 'D']);
    parse_float(digits)
}

/// Value of a `'c'` or `L'c'` lexeme.
pub(crate) fn char_value(lexeme: &str) -> Result<char, String> {
    let text = unescape(strip_quotes(lexeme, '\''))?;
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        (None, _) => Err("empty character literal".to_string()),
        _ => Err("more than one character".to_string()),
    }
}

/// Value of a `"..."` or `L"..."` lexeme.
pub(crate) fn string_value(lexeme: &str) -> Result<String, String> {
    unescape(strip_quotes(lexeme, '"'))
}

fn strip_quotes(lexeme: &str, quote: char) -> &str {
    let text = lexeme.strip_prefix('L').unwrap_or(lexeme);
    let text = text.strip_prefix(quote).unwrap_or(text);
    text.strip_suffix(quote).unwrap_or(text)
}

fn unescape(body: &str) -> Result<String, String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('v') => '\u{0b}',
            Some('b') => '\u{08}',
            Some('r') => '\r',
            Some('f') => '\u{0c}',
            Some('a') => '\u{07}',
            Some(c @ ('\\' | '?' | '\'' | '"')) => c,
            Some(first @ '0'..='7') => {
                let mut code = first.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                char::from_u32(code).ok_or_else(|| format!("invalid octal escape {code:o}"))?
            }
            Some(kind @ ('x' | 'u')) => {
                let max_digits = if kind == 'x' { 2 } else { 4 };
                let mut code = 0u32;
                let mut count = 0;
                while count < max_digits {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(d) => {
                            code = code * 16 + d;
                            chars.next();
                            count += 1;
                        }
                        None => break,
                    }
                }
                if count == 0 {
                    return Err(format!("`\\{kind}` escape without hex digits"));
                }
                char::from_u32(code).ok_or_else(|| format!("invalid escape code {code:x}"))?
            }
            Some(other) => return Err(format!("unknown escape `\\{other}`")),
            None => return Err("dangling backslash".to_string()),
        };
        out.push(escaped);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_by_radix() {
        assert_eq!(
            parse_integer("42", LiteralKind::Decimal),
            Ok((42, Radix::Decimal))
        );
        assert_eq!(parse_integer("017", LiteralKind::Octal), Ok((15, Radix::Octal)));
        assert_eq!(parse_integer("0xFF", LiteralKind::Hex), Ok((255, Radix::Hex)));
        assert!(parse_integer("09", LiteralKind::Octal).is_err());
        assert!(parse_integer("99999999999999999999", LiteralKind::Decimal).is_err());
    }

    #[test]
    fn escapes() {
        assert_eq!(char_value(r"'\n'"), Ok('\n'));
        assert_eq!(char_value(r"L'\x41'"), Ok('A'));
        assert_eq!(char_value(r"'\101'"), Ok('A'));
        assert_eq!(string_value(r#""a\tb\"""#), Ok("a\tb\"".to_string()));
        assert!(string_value(r#""\q""#).is_err());
        assert!(char_value("'ab'").is_err());
    }

    #[test]
    fn fixed_and_float() {
        assert_eq!(parse_fixed("1.5d"), Ok(1.5));
        assert_eq!(parse_fixed("12D"), Ok(12.0));
        assert_eq!(parse_float(".5e1"), Ok(5.0));
    }
}
