use omgidl_core::{Diagnostics, ast::Specification};
use omgidl_parser::parse_str;
use omgidl_semantic::{SymbolTable, TypeEntry, TypeModel, analyze};

use crate::{error::IdlError, options::ParseOptions};

/// One parsed and analysed IDL compilation unit.
///
/// Always produced, even for malformed text: check
/// [`has_errors`](Self::has_errors) before decoding against the
/// [`model`](Self::model).
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    options: ParseOptions,
    pub specification: Specification,
    pub symbols: SymbolTable,
    pub model: TypeModel,
    /// Lexical, syntax and semantic diagnostics, in document order.
    pub diagnostics: Diagnostics,
}

impl Document {
    pub(crate) fn build(text: &str, options: &ParseOptions) -> Self {
        let parsed = parse_str(text, &options.parser_config());
        let mut specification = parsed.specification;
        let analysis = analyze(&mut specification, &options.analysis_config());

        let mut diagnostics = parsed.diagnostics;
        diagnostics.extend(analysis.diagnostics);
        diagnostics.sort_by_position();
        log::debug!(
            "document built: bytes={}, tokens={}, definitions={}, errors={}, warnings={}",
            text.len(),
            parsed.token_count,
            specification.definitions.len(),
            diagnostics.error_count(),
            diagnostics.warning_count()
        );

        Self {
            source: text.to_string(),
            options: *options,
            specification,
            symbols: analysis.symbols,
            model: analysis.model,
            diagnostics,
        }
    }

    /// The text this document was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// `Err` with the first error diagnostic when the document has any.
    pub fn check(&self) -> Result<(), IdlError> {
        match self.diagnostics.errors().next() {
            Some(first) => Err(IdlError::Invalid {
                count: self.diagnostics.error_count(),
                first: first.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Model entry for a ROS-style type name (`pkg/msg/Type`) or a scoped
    /// name (`pkg::msg::Type`).
    pub fn type_entry(&self, type_name: &str) -> Option<&TypeEntry> {
        let scoped = type_name
            .split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("::");
        self.model.get_by_name(&scoped)
    }
}
