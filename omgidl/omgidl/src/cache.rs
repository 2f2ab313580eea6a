//! Process-wide cache of analysed schemas, keyed by content hash.

use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::{Arc, OnceLock, PoisonError, RwLock},
};

use crate::{document::Document, options::ParseOptions};

/// Maps the hash of a schema text (and the options it was parsed with) to
/// the analysed [`Document`].
///
/// Lookups take a read lock; an insert stores a document only when no entry
/// exists for its hash yet. A hit is only returned when the stored text is
/// equal to the requested one.
///
/// Entries are never evicted. Long-running processes that see an unbounded
/// stream of distinct schemas should call [`SchemaCache::clear`] themselves,
/// or parse with [`ParseOptions::builder`]`().with_cache(false)`.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<u64, Arc<Document>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by every caller in this process.
    pub fn global() -> &'static SchemaCache {
        static GLOBAL: OnceLock<SchemaCache> = OnceLock::new();
        GLOBAL.get_or_init(SchemaCache::new)
    }

    /// Cached document for `text` parsed with `options`.
    pub fn get(&self, text: &str, options: &ParseOptions) -> Option<Arc<Document>> {
        let key = content_hash(text, options);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let doc = entries
            .get(&key)
            .filter(|doc| same_input(doc, text, options))
            .cloned();
        log::trace!(
            "schema cache {}: hash={key:016x}",
            if doc.is_some() { "hit" } else { "miss" }
        );
        doc
    }

    /// Store `doc` unless an entry for its hash already exists, and return
    /// the document now associated with its text.
    pub fn insert(&self, doc: Arc<Document>) -> Arc<Document> {
        let key = content_hash(doc.source(), doc.options());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let stored = entries.entry(key).or_insert_with(|| Arc::clone(&doc));
        if same_input(stored, doc.source(), doc.options()) {
            Arc::clone(stored)
        } else {
            log::warn!("schema cache hash collision: hash={key:016x}, keeping the first entry");
            doc
        }
    }

    /// Cached document for `text`, building and storing it on a miss.
    ///
    /// `build` runs without holding the lock, so two threads missing on the
    /// same text may both build; the first insert wins and both get it.
    pub fn get_or_insert_with(
        &self,
        text: &str,
        options: &ParseOptions,
        build: impl FnOnce() -> Document,
    ) -> Arc<Document> {
        if let Some(doc) = self.get(text, options) {
            return doc;
        }
        self.insert(Arc::new(build()))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn same_input(doc: &Document, text: &str, options: &ParseOptions) -> bool {
    doc.source() == text
        && doc.options().max_nesting() == options.max_nesting()
        && doc.options().dangling_forward_as_error() == options.dangling_forward_as_error()
}

/// Hash of a schema text together with the options that affect its
/// analysis.
pub fn content_hash(text: &str, options: &ParseOptions) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    options.max_nesting().hash(&mut hasher);
    options.dangling_forward_as_error().hash(&mut hasher);
    hasher.finish()
}
