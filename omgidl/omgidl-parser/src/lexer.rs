//! Tokenizer for OMG IDL source text.
//!
//! Whitespace, comments and preprocessor lines (`#include`, `#pragma`) are
//! non-semantic and produce no tokens. Malformed input never stops the scan:
//! it yields an [`TokenKind::Invalid`] token plus a [`LexError`], and lexing
//! resumes right after the offending lexeme.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{tag, take_until},
    character::complete::{
        alpha1, alphanumeric1, char, digit0, digit1, hex_digit1, not_line_ending, one_of,
    },
    combinator::{map, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
};
use omgidl_core::{Keyword, LiteralKind, Punct, Span, Token, TokenKind};

use crate::{error::LexError, literal};

/// Split `text` into tokens. The returned vector always ends with an
/// [`TokenKind::Eof`] token.
pub fn tokenize(text: &str) -> (Vec<Token>, Vec<LexError>) {
    let mut lexer = Lexer::new(text);
    lexer.run();
    (lexer.tokens, lexer.errors)
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    /// Only whitespace seen so far on the current line.
    line_start: bool,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 1,
            line_start: true,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
                continue;
            }
            let rest = self.rest();
            if c == '#' && self.line_start {
                let len = skip_directive(rest);
                self.advance(len);
                continue;
            }
            if let Ok((remaining, _)) = line_comment(rest) {
                self.advance(rest.len() - remaining.len());
                continue;
            }
            if rest.starts_with("/*") {
                match block_comment(rest) {
                    Ok((remaining, _)) => self.advance(rest.len() - remaining.len()),
                    Err(_) => {
                        let span = self.span_of(2);
                        self.errors.push(LexError::UnterminatedComment { span });
                        self.advance(rest.len());
                    }
                }
                continue;
            }
            self.line_start = false;
            self.lex_token(c);
        }
        let eof = Span::new(self.src.len(), 0, self.line, self.column);
        self.tokens.push(Token::new(TokenKind::Eof, "", eof));
    }

    fn lex_token(&mut self, c: char) {
        let rest = self.rest();
        if rest.starts_with("L'") || c == '\'' {
            self.lex_quoted('\'');
        } else if rest.starts_with("L\"") || c == '"' {
            self.lex_quoted('"');
        } else if let Ok((_, ident)) = identifier(rest) {
            let kind = match Keyword::from_ident(ident) {
                Some(keyword) => TokenKind::Keyword(keyword),
                None => TokenKind::Ident,
            };
            self.push(kind, ident.len());
        } else if let Ok((remaining, kind)) = numeric_literal(rest) {
            let len = rest.len() - remaining.len();
            self.lex_number(kind, len);
        } else if let Some((punct, len)) = punctuation(rest) {
            self.push(TokenKind::Punct(punct), len);
        } else {
            let span = self.span_of(c.len_utf8());
            self.errors.push(LexError::UnrecognizedCharacter { ch: c, span });
            self.push(TokenKind::Invalid, c.len_utf8());
        }
    }

    fn lex_number(&mut self, kind: LiteralKind, len: usize) {
        let rest = self.rest();
        // `12abc`, `0x`, `1e`: swallow the whole run so it is reported once.
        let trailing = rest[len..]
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(rest.len() - len);
        if trailing > 0 {
            let total = len + trailing;
            self.malformed("numeric", total, "unexpected characters after number".into());
            return;
        }

        let lexeme = &rest[..len];
        let checked = match kind {
            LiteralKind::Decimal | LiteralKind::Octal | LiteralKind::Hex => {
                literal::parse_integer(lexeme, kind).map(|_| ())
            }
            LiteralKind::Fixed => literal::parse_fixed(lexeme).map(|_| ()),
            _ => literal::parse_float(lexeme).map(|_| ()),
        };
        match checked {
            Ok(()) => self.push(TokenKind::Literal(kind), len),
            Err(reason) => self.malformed("numeric", len, reason),
        }
    }

    /// Character and string literals, with an optional `L` wide prefix.
    fn lex_quoted(&mut self, quote: char) {
        let rest = self.rest();
        let wide = rest.starts_with('L');
        let body_start = if wide { 2 } else { 1 };

        let mut escaped = false;
        let mut end = None;
        for (i, c) in rest[body_start..].char_indices() {
            if c == '\n' {
                break;
            }
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                end = Some(body_start + i + 1);
                break;
            }
        }

        let Some(len) = end else {
            let len = rest.find('\n').unwrap_or(rest.len());
            let span = self.span_of(len);
            self.errors.push(if quote == '"' {
                LexError::UnterminatedString { span }
            } else {
                LexError::UnterminatedChar { span }
            });
            self.push(TokenKind::Invalid, len);
            return;
        };

        let lexeme = &rest[..len];
        let (kind, checked) = match (quote, wide) {
            ('\'', false) => (LiteralKind::Char, literal::char_value(lexeme).map(|_| ())),
            ('\'', true) => (LiteralKind::WChar, literal::char_value(lexeme).map(|_| ())),
            (_, false) => (LiteralKind::String, literal::string_value(lexeme).map(|_| ())),
            (_, true) => (LiteralKind::WString, literal::string_value(lexeme).map(|_| ())),
        };
        match checked {
            Ok(()) => self.push(TokenKind::Literal(kind), len),
            Err(reason) => {
                let what = if quote == '"' { "string" } else { "character" };
                self.malformed(what, len, reason);
            }
        }
    }

    fn malformed(&mut self, what: &'static str, len: usize, reason: String) {
        let span = self.span_of(len);
        let lexeme = self.rest()[..len].to_string();
        self.errors.push(LexError::MalformedLiteral {
            what,
            lexeme,
            reason,
            span,
        });
        self.push(TokenKind::Invalid, len);
    }

    fn push(&mut self, kind: TokenKind, len: usize) {
        let span = self.span_of(len);
        let lexeme = &self.src[self.pos..self.pos + len];
        self.tokens.push(Token::new(kind, lexeme, span));
        self.advance(len);
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn span_of(&self, len: usize) -> Span {
        Span::new(self.pos, len, self.line, self.column)
    }

    fn advance(&mut self, len: usize) {
        for c in self.src[self.pos..self.pos + len].chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
                self.line_start = true;
            } else {
                self.column += 1;
            }
        }
        self.pos += len;
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    preceded(tag("//"), not_line_ending)(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("/*"), take_until("*/"), tag("*/"))(input)
}

/// Byte length of a preprocessor line, honouring `\` line continuations.
fn skip_directive(input: &str) -> usize {
    let mut len = 0;
    for line in input.split_inclusive('\n') {
        len += line.len();
        if !line.trim_end().ends_with('\\') {
            break;
        }
    }
    // Leave the newline itself to the whitespace path.
    if input[..len].ends_with('\n') {
        len -= 1;
    }
    len
}

/// Integer, floating-point and fixed-point literal shapes.
///
/// Order matters: hex before octal before decimal, fixed (`d` suffix)
/// before float, and a lone `0` is decimal.
fn numeric_literal(input: &str) -> IResult<&str, LiteralKind> {
    alt((
        map(
            recognize(tuple((char('0'), one_of("xX"), hex_digit1))),
            |_| LiteralKind::Hex,
        ),
        map(
            recognize(pair(alt((mantissa, digit1)), one_of("dD"))),
            |_| LiteralKind::Fixed,
        ),
        map(recognize(pair(mantissa, opt(exponent))), |_| {
            LiteralKind::Float
        }),
        map(recognize(pair(digit1, exponent)), |_| LiteralKind::Float),
        map(recognize(pair(char('0'), digit1)), |_| LiteralKind::Octal),
        map(digit1, |_| LiteralKind::Decimal),
    ))(input)
}

fn mantissa(input: &str) -> IResult<&str, &str> {
    alt((
        recognize(tuple((digit1, char('.'), digit0))),
        recognize(pair(char('.'), digit1)),
    ))(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn punctuation(input: &str) -> Option<(Punct, usize)> {
    if input.starts_with("::") {
        return Some((Punct::ColonColon, 2));
    }
    let punct = match input.chars().next()? {
        ';' => Punct::Semi,
        ':' => Punct::Colon,
        ',' => Punct::Comma,
        '{' => Punct::LBrace,
        '}' => Punct::RBrace,
        '(' => Punct::LParen,
        ')' => Punct::RParen,
        '[' => Punct::LBracket,
        ']' => Punct::RBracket,
        '<' => Punct::Lt,
        '>' => Punct::Gt,
        '=' => Punct::Eq,
        '+' => Punct::Plus,
        '-' => Punct::Minus,
        '*' => Punct::Star,
        '/' => Punct::Slash,
        '%' => Punct::Percent,
        '~' => Punct::Tilde,
        '|' => Punct::Pipe,
        '^' => Punct::Caret,
        '&' => Punct::Amp,
        '@' => Punct::At,
        _ => return None,
    };
    Some((punct, 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_shapes() {
        assert_eq!(numeric_literal("0"), Ok(("", LiteralKind::Decimal)));
        assert_eq!(numeric_literal("017"), Ok(("", LiteralKind::Octal)));
        assert_eq!(numeric_literal("0x1f;"), Ok((";", LiteralKind::Hex)));
        assert_eq!(numeric_literal("1.5"), Ok(("", LiteralKind::Float)));
        assert_eq!(numeric_literal(".5e-3"), Ok(("", LiteralKind::Float)));
        assert_eq!(numeric_literal("2e10"), Ok(("", LiteralKind::Float)));
        assert_eq!(numeric_literal("12.50d"), Ok(("", LiteralKind::Fixed)));
        assert_eq!(numeric_literal("7D"), Ok(("", LiteralKind::Fixed)));
    }

    #[test]
    fn directive_with_continuation() {
        let text = "#define X \\\n  1\nstruct";
        let len = skip_directive(text);
        assert_eq!(&text[len..], "\nstruct");
    }
}
