use omgidl_parser::{DEFAULT_MAX_NESTING, ParserConfig};
use omgidl_semantic::AnalysisConfig;

/// Options for [`parse_with`](crate::parse_with) and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParseOptions {
    max_nesting: usize,
    use_cache: bool,
    dangling_forward_as_error: bool,
}

/// Builder for configuring [`ParseOptions`].
#[derive(Debug, Clone)]
pub struct ParseOptionsBuilder {
    options: ParseOptions,
}

impl ParseOptions {
    /// Create a builder for [`ParseOptions`].
    pub fn builder() -> ParseOptionsBuilder {
        ParseOptionsBuilder {
            options: Self::default(),
        }
    }

    pub fn max_nesting(&self) -> usize {
        self.max_nesting
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    pub fn dangling_forward_as_error(&self) -> bool {
        self.dangling_forward_as_error
    }

    pub(crate) fn parser_config(&self) -> ParserConfig {
        ParserConfig {
            max_nesting: self.max_nesting,
        }
    }

    pub(crate) fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            dangling_forward_as_error: self.dangling_forward_as_error,
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
            use_cache: true,
            dangling_forward_as_error: false,
        }
    }
}

impl ParseOptionsBuilder {
    /// Maximum nesting of scopes, templates and parenthesised expressions
    /// (default: 256).
    pub fn with_max_nesting(mut self, depth: usize) -> Self {
        self.options.max_nesting = depth;
        self
    }

    /// Consult and populate [`SchemaCache::global`](crate::SchemaCache::global)
    /// (default: true).
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.options.use_cache = enabled;
        self
    }

    /// Report forward declarations that are never completed as errors
    /// (default: false, they are warnings).
    pub fn with_dangling_forward_as_error(mut self, enabled: bool) -> Self {
        self.options.dangling_forward_as_error = enabled;
        self
    }

    /// Build the options.
    pub fn build(self) -> ParseOptions {
        self.options
    }
}
