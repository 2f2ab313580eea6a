//! OMG IDL front-end.
//!
//! # Pipeline
//!
//! ```text
//! IDL text (or a `ros2idl` schema bundle)
//!   └─ SchemaCache lookup        – content hash of text + options
//!       └─ omgidl_parser::parse_str    – tokens → Specification + syntax diagnostics
//!           └─ omgidl_semantic::analyze  – scopes, constants, validation → TypeModel
//!               └─ Document          – stored in the cache, shared through Arc
//! ```
//!
//! Every entry point returns a [`Document`] for any input text; malformed
//! input shows up as diagnostics, never as a panic. [`resolve`] and
//! [`resolve_schema`] additionally reject documents with errors.

mod cache;
mod document;
mod error;
mod options;

use std::{fs, path::Path, sync::Arc};

use omgidl_parser::{SchemaBundle, normalized_text};
use rayon::prelude::*;

pub use cache::{SchemaCache, content_hash};
pub use document::Document;
pub use error::IdlError;
pub use omgidl_core as core;
pub use omgidl_parser as parser;
pub use omgidl_semantic as semantic;
pub use options::{ParseOptions, ParseOptionsBuilder};

/// Parse and analyse one compilation unit with default options.
pub fn parse(text: &str) -> Arc<Document> {
    parse_with(text, &ParseOptions::default())
}

/// Parse and analyse one compilation unit.
pub fn parse_with(text: &str, options: &ParseOptions) -> Arc<Document> {
    if options.use_cache() {
        SchemaCache::global().get_or_insert_with(text, options, || Document::build(text, options))
    } else {
        Arc::new(Document::build(text, options))
    }
}

/// Like [`parse`], but a document with error diagnostics is an
/// [`IdlError::Invalid`].
pub fn resolve(text: &str) -> Result<Arc<Document>, IdlError> {
    let doc = parse(text);
    doc.check()?;
    Ok(doc)
}

/// Parse the schema of a channel whose type is `schema_name`
/// (`pkg/msg/Type`).
///
/// `schema_text` may be a plain IDL document or a `====`-separated bundle.
/// The document must be free of errors and define `schema_name`.
pub fn resolve_schema(
    schema_name: &str,
    schema_text: &str,
    options: &ParseOptions,
) -> Result<Arc<Document>, IdlError> {
    let doc = if SchemaBundle::is_bundle(schema_text) {
        SchemaBundle::parse(schema_name, schema_text)?;
        parse_with(&normalized_text(schema_text), options)
    } else {
        parse_with(schema_text, options)
    };
    doc.check()?;
    if doc.type_entry(schema_name).is_none() {
        return Err(IdlError::TypeNotFound {
            schema_name: schema_name.to_string(),
        });
    }
    Ok(doc)
}

/// Read and parse an IDL file.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Arc<Document>, IdlError> {
    let text = fs::read_to_string(path).map_err(|source| IdlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_with(&text, options))
}

/// Parse independent documents in parallel. The result is in input order.
///
/// Documents share nothing but the schema cache, so identical texts in
/// `texts` are analysed once when caching is enabled.
pub fn parse_many<S>(texts: &[S], options: &ParseOptions) -> Vec<Arc<Document>>
where
    S: AsRef<str> + Sync,
{
    log::debug!("parsing {} documents in parallel", texts.len());
    texts
        .par_iter()
        .map(|text| parse_with(text.as_ref(), options))
        .collect()
}
