//! OMG IDL lexer and recursive-descent parser.
//!
//! # Pipeline
//!
//! ```text
//! IDL text
//!   └─ tokenize        – nom-based lexer → Vec<Token> + LexErrors
//!       └─ parse       – recursive descent → Specification + SyntaxErrors
//! ```
//!
//! [`parse_str`] runs both steps and merges their errors into
//! [`Diagnostics`]. Neither step stops at the first problem.
//!
//! ```rust
//! use omgidl_parser::{ParserConfig, parse_str};
//!
//! let out = parse_str("struct Point { double x; double y; };", &ParserConfig::default());
//! assert!(!out.diagnostics.has_errors());
//! assert_eq!(out.specification.definitions.len(), 1);
//! ```

mod bundle;
mod config;
mod error;
mod lexer;
mod literal;
mod parser;

use omgidl_core::{Diagnostics, ast::Specification};

pub use bundle::{BundleError, IdlSection, SchemaBundle, normalized_text};
pub use config::{DEFAULT_MAX_NESTING, ParserConfig};
pub use error::{LexError, SyntaxError};
pub use lexer::tokenize;
pub use parser::parse;

/// Result of [`parse_str`].
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub specification: Specification,
    /// Lexical and syntax errors, in document order.
    pub diagnostics: Diagnostics,
    pub token_count: usize,
}

/// Tokenize and parse one compilation unit.
pub fn parse_str(text: &str, config: &ParserConfig) -> ParseOutput {
    let (tokens, lex_errors) = tokenize(text);
    log::debug!(
        "lexed {} tokens with {} lexical errors",
        tokens.len(),
        lex_errors.len()
    );
    let (specification, syntax_errors) = parse(&tokens, config);
    log::debug!(
        "parsed {} top-level definitions with {} syntax errors",
        specification.definitions.len(),
        syntax_errors.len()
    );

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(lex_errors);
    diagnostics.extend(syntax_errors);
    diagnostics.sort_by_position();
    ParseOutput {
        specification,
        diagnostics,
        token_count: tokens.len(),
    }
}
