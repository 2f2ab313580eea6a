//! Lexer and parser error types.

use omgidl_core::{Diagnostic, Phase, Span};

/// Error produced while tokenizing; the lexer always recovers and continues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unrecognized character `{ch}`")]
    UnrecognizedCharacter { ch: char, span: Span },

    #[error("unterminated block comment")]
    UnterminatedComment { span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated character literal")]
    UnterminatedChar { span: Span },

    #[error("malformed {what} literal `{lexeme}`: {reason}")]
    MalformedLiteral {
        what: &'static str,
        lexeme: String,
        reason: String,
        span: Span,
    },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnrecognizedCharacter { span, .. }
            | LexError::UnterminatedComment { span }
            | LexError::UnterminatedString { span }
            | LexError::UnterminatedChar { span }
            | LexError::MalformedLiteral { span, .. } => *span,
        }
    }
}

impl From<LexError> for Diagnostic {
    fn from(err: LexError) -> Self {
        Diagnostic::error(Phase::Lex, err.to_string(), err.span())
    }
}

/// Error produced when the token stream does not match the grammar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("expected {expected}, found {found}")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("nesting exceeds the limit of {limit} levels")]
    NestingTooDeep { limit: usize, span: Span },

    #[error("{message}")]
    Invalid { message: String, span: Span },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::Expected { span, .. }
            | SyntaxError::NestingTooDeep { span, .. }
            | SyntaxError::Invalid { span, .. } => *span,
        }
    }
}

impl From<SyntaxError> for Diagnostic {
    fn from(err: SyntaxError) -> Self {
        Diagnostic::error(Phase::Syntax, err.to_string(), err.span())
    }
}
