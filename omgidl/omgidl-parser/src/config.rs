/// Default for [`ParserConfig::max_nesting`].
pub const DEFAULT_MAX_NESTING: usize = 256;

/// Tuning knobs for [`parse`](crate::parse).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum depth of nested scopes, type templates and parenthesised
    /// expressions. Input nested deeper yields a single syntax error.
    pub max_nesting: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}
