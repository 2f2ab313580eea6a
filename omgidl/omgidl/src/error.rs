//! Error types for the IDL front-end.

use std::path::PathBuf;

use omgidl_core::Diagnostic;
use omgidl_parser::BundleError;

/// Errors produced by [`resolve`](crate::resolve),
/// [`resolve_schema`](crate::resolve_schema) and
/// [`parse_file`](crate::parse_file).
#[derive(Debug, thiserror::Error)]
pub enum IdlError {
    /// The document has at least one error-severity diagnostic.
    #[error("IDL document has {count} error(s), first: {first}")]
    Invalid { count: usize, first: Diagnostic },

    /// The schema blob could not be split into IDL sections.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The schema parsed, but does not define the type it is named after.
    #[error("type '{schema_name}' is not defined by its schema")]
    TypeNotFound { schema_name: String },

    /// I/O error while reading an IDL file.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
