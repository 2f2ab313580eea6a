use clap::ValueEnum;
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::{Error, SimpleFile},
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use omgidl::core::{Diagnostic as IdlDiagnostic, Severity};

#[derive(Clone, Copy, Debug, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl From<ColorMode> for ColorChoice {
    fn from(mode: ColorMode) -> Self {
        match mode {
            ColorMode::Auto => ColorChoice::Auto,
            ColorMode::Always => ColorChoice::Always,
            ColorMode::Never => ColorChoice::Never,
        }
    }
}

/// Renders diagnostics to stderr with source snippets.
pub struct Reporter {
    writer: StandardStream,
    config: term::Config,
}

impl Reporter {
    pub fn new(color: ColorMode) -> Self {
        Self {
            writer: StandardStream::stderr(color.into()),
            config: term::Config::default(),
        }
    }

    /// Emit every diagnostic of one file.
    pub fn emit_all<'a>(
        &mut self,
        name: &str,
        source: &str,
        diagnostics: impl IntoIterator<Item = &'a IdlDiagnostic>,
    ) -> Result<(), Error> {
        let file = SimpleFile::new(name, source);
        let mut lock = self.writer.lock();
        for diagnostic in diagnostics {
            term::emit(&mut lock, &self.config, &file, &to_reporting(diagnostic))?;
        }
        Ok(())
    }
}

fn to_reporting(diagnostic: &IdlDiagnostic) -> Diagnostic<()> {
    let report = match diagnostic.severity {
        Severity::Error => Diagnostic::error(),
        Severity::Warning => Diagnostic::warning(),
    };
    let span = diagnostic.span;
    report
        .with_code(diagnostic.phase.to_string())
        .with_message(diagnostic.message.clone())
        .with_labels(vec![Label::primary((), span.offset..span.end())])
}

#[cfg(test)]
mod tests {
    use omgidl::core::{Phase, Span};

    use super::*;

    #[test]
    fn labels_cover_the_span() {
        let diagnostic = IdlDiagnostic::warning(
            Phase::Semantic,
            "struct `X` is forward-declared but never defined",
            Span::new(7, 1, 1, 8),
        );
        let report = to_reporting(&diagnostic);
        assert_eq!(report.severity, codespan_reporting::diagnostic::Severity::Warning);
        assert_eq!(report.code.as_deref(), Some("semantic"));
        assert_eq!(report.labels[0].range, 7..8);
    }
}
