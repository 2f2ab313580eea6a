//! Shared vocabulary of the `omgidl` front-end.
//!
//! This crate has no parsing or analysis logic of its own. It defines the
//! types every phase exchanges: source [`Span`]s, lexer [`Token`]s, the
//! typed [`ast`], evaluated constant values and [`Diagnostic`]s.

pub mod ast;
mod diagnostic;
mod format;
mod id;
mod span;
mod token;
mod value;

pub use diagnostic::{Diagnostic, Diagnostics, Phase, Severity};
pub use format::{format_expr, format_specification, format_type_spec};
pub use id::DefId;
pub use span::Span;
pub use token::{Keyword, LiteralKind, Punct, Token, TokenKind};
pub use value::{ConstType, ConstValue, EvaluatedConstant, IntKind};
