//! Semantic analysis of parsed OMG IDL.
//!
//! # Pipeline
//!
//! ```text
//! Specification (from omgidl-parser)
//!   └─ build_scopes   – arena SymbolTable, forward slots, enumerator injection
//!       └─ resolve    – bind NamedType targets, evaluate ConstExpr values
//!           └─ validate       – duplicates, union labels, bounds, bit widths
//!               └─ build_model  – TypeModel with decode layout facts
//! ```
//!
//! [`analyze`] runs all four passes. Each pass collects every problem it
//! finds; none of them stops early.

mod config;
mod error;
mod eval;
mod model;
mod resolve;
mod scope_builder;
mod symbol_table;
mod typing;
mod validate;

use omgidl_core::{Diagnostics, ast::Specification};

pub use config::AnalysisConfig;
pub use error::{EvalError, LookupError};
pub use eval::evaluate;
pub use model::{
    AliasLayout, BitFlag, BitfieldLayout, BitmaskLayout, BitsetLayout, EnumLayout, Field,
    ResolvedType, StructLayout, TypeEntry, TypeKind, TypeModel, UnionCase, UnionLayout,
    build_model, format_type_model,
};
pub use resolve::resolve;
pub use scope_builder::build_scopes;
pub use symbol_table::{Alias, ConstSlot, DefState, Redeclaration, Symbol, SymbolKind, SymbolTable};
pub use validate::validate;

/// Result of [`analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub model: TypeModel,
    /// Semantic errors and warnings, in document order.
    pub diagnostics: Diagnostics,
}

/// Run every semantic pass over `spec`, filling in resolved type targets
/// and constant values in place.
pub fn analyze(spec: &mut Specification, config: &AnalysisConfig) -> Analysis {
    let (mut symbols, scope_errors) = build_scopes(spec);
    let resolve_errors = resolve(spec, &mut symbols);
    let validate_errors = validate(spec, &symbols, config);
    let model = build_model(spec, &symbols);

    let mut diagnostics = Diagnostics::new();
    diagnostics.extend(scope_errors);
    diagnostics.extend(resolve_errors);
    diagnostics.extend(validate_errors);
    diagnostics.sort_by_position();
    log::debug!(
        "analysis done: symbols={}, model entries={}, errors={}, warnings={}",
        symbols.len(),
        model.len(),
        diagnostics.error_count(),
        diagnostics.warning_count()
    );
    Analysis {
        symbols,
        model,
        diagnostics,
    }
}
