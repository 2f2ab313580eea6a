use omgidl_core::{Keyword, LiteralKind, Punct, TokenKind};
use omgidl_parser::{LexError, tokenize};

fn kinds(text: &str) -> Vec<TokenKind> {
    let (tokens, errors) = tokenize(text);
    assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
    tokens.into_iter().map(|t| t.kind).collect()
}

// ── token classes ─────────────────────────────────────────────────────────────

#[test]
fn keywords_identifiers_and_punctuation() {
    assert_eq!(
        kinds("struct Point { long x; };"),
        vec![
            TokenKind::Keyword(Keyword::Struct),
            TokenKind::Ident,
            TokenKind::Punct(Punct::LBrace),
            TokenKind::Keyword(Keyword::Long),
            TokenKind::Ident,
            TokenKind::Punct(Punct::Semi),
            TokenKind::Punct(Punct::RBrace),
            TokenKind::Punct(Punct::Semi),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn keywords_are_case_sensitive() {
    assert_eq!(
        kinds("Struct STRUCT struct"),
        vec![
            TokenKind::Ident,
            TokenKind::Ident,
            TokenKind::Keyword(Keyword::Struct),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn scope_operator_is_one_token_but_angles_are_not_glued() {
    assert_eq!(
        kinds("::a::b >> <<"),
        vec![
            TokenKind::Punct(Punct::ColonColon),
            TokenKind::Ident,
            TokenKind::Punct(Punct::ColonColon),
            TokenKind::Ident,
            TokenKind::Punct(Punct::Gt),
            TokenKind::Punct(Punct::Gt),
            TokenKind::Punct(Punct::Lt),
            TokenKind::Punct(Punct::Lt),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn numeric_literal_kinds() {
    let lit = |k| TokenKind::Literal(k);
    assert_eq!(
        kinds("0 10 017 0x1F 1.5 .5 2e3 3.25d"),
        vec![
            lit(LiteralKind::Decimal),
            lit(LiteralKind::Decimal),
            lit(LiteralKind::Octal),
            lit(LiteralKind::Hex),
            lit(LiteralKind::Float),
            lit(LiteralKind::Float),
            lit(LiteralKind::Float),
            lit(LiteralKind::Fixed),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn char_and_string_literals_with_wide_prefix() {
    let (tokens, errors) = tokenize(r#"'a' L'b' "s\"q" L"w" Lx"#);
    assert!(errors.is_empty());
    let got: Vec<_> = tokens.iter().map(|t| (t.kind, t.lexeme.as_str())).collect();
    assert_eq!(
        got,
        vec![
            (TokenKind::Literal(LiteralKind::Char), "'a'"),
            (TokenKind::Literal(LiteralKind::WChar), "L'b'"),
            (TokenKind::Literal(LiteralKind::String), r#""s\"q""#),
            (TokenKind::Literal(LiteralKind::WString), r#"L"w""#),
            (TokenKind::Ident, "Lx"),
            (TokenKind::Eof, ""),
        ]
    );
}

// ── trivia ────────────────────────────────────────────────────────────────────

#[test]
fn comments_and_preprocessor_lines_are_skipped() {
    let text = "#include <a.idl>\n// line\n/* block\n spanning */ module M /* x */ {};\n#pragma once";
    assert_eq!(
        kinds(text),
        vec![
            TokenKind::Keyword(Keyword::Module),
            TokenKind::Ident,
            TokenKind::Punct(Punct::LBrace),
            TokenKind::Punct(Punct::RBrace),
            TokenKind::Punct(Punct::Semi),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn spans_track_lines_and_columns() {
    let (tokens, _) = tokenize("module M {\n  struct S {};\n};");
    let s = tokens
        .iter()
        .find(|t| t.lexeme == "S")
        .expect("S token should exist");
    assert_eq!((s.span.line, s.span.column), (2, 10));
    assert_eq!(s.span.offset, 20);
    assert_eq!(s.span.len, 1);
}

// ── recovery ──────────────────────────────────────────────────────────────────

#[test]
fn unrecognized_character_yields_invalid_token_and_continues() {
    let (tokens, errors) = tokenize("long $ x;");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        LexError::UnrecognizedCharacter { ch, span } => {
            assert_eq!(*ch, '$');
            assert_eq!(span.column, 6);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword(Keyword::Long),
            TokenKind::Invalid,
            TokenKind::Ident,
            TokenKind::Punct(Punct::Semi),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn malformed_literals_are_reported_once() {
    let (tokens, errors) = tokenize("09 12abc 0x 99999999999999999999 '\\q'");
    assert_eq!(errors.len(), 5, "{errors:?}");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, LexError::MalformedLiteral { .. }))
    );
    assert_eq!(
        tokens.iter().filter(|t| t.kind == TokenKind::Invalid).count(),
        5
    );
}

#[test]
fn unterminated_constructs() {
    let (_, errors) = tokenize("\"abc\nstruct");
    assert!(matches!(errors[..], [LexError::UnterminatedString { .. }]));

    let (tokens, errors) = tokenize("struct /* never closed");
    assert!(matches!(errors[..], [LexError::UnterminatedComment { .. }]));
    assert_eq!(tokens.len(), 2);
}
