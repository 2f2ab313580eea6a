/// Knobs for the semantic passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnalysisConfig {
    /// Report forward declarations that are never completed as errors
    /// instead of warnings.
    pub dangling_forward_as_error: bool,
}
