use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use omgidl::{
    ParseOptions, parse_many,
    parser::{DEFAULT_MAX_NESTING, normalized_text},
};

use crate::report::{ColorMode, Reporter};

#[derive(Args)]
pub struct CheckArgs {
    /// IDL files to check
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Inputs are ros2idl schema bundles (`====` separated sections)
    #[arg(long)]
    bundle: bool,

    /// Report forward declarations that are never defined as errors
    #[arg(long)]
    strict_forward: bool,

    /// Maximum nesting depth of scopes, templates and expressions
    #[arg(long, default_value_t = DEFAULT_MAX_NESTING)]
    max_nesting: usize,

    /// When to color diagnostics
    #[arg(long, value_enum, default_value_t = ColorMode::Auto)]
    color: ColorMode,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let options = ParseOptions::builder()
            .with_max_nesting(self.max_nesting)
            .with_dangling_forward_as_error(self.strict_forward)
            .build();

        let mut texts = Vec::with_capacity(self.inputs.len());
        for path in &self.inputs {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            texts.push(if self.bundle {
                normalized_text(&text)
            } else {
                text
            });
        }

        let docs = parse_many(&texts, &options);
        let mut reporter = Reporter::new(self.color);
        let (mut errors, mut warnings, mut failed) = (0, 0, 0);
        for (path, doc) in self.inputs.iter().zip(&docs) {
            let name = path.display().to_string();
            reporter.emit_all(&name, doc.source(), doc.diagnostics.iter())?;
            errors += doc.diagnostics.error_count();
            warnings += doc.diagnostics.warning_count();
            if doc.has_errors() {
                failed += 1;
            }
        }

        eprintln!(
            "checked {} file(s): {errors} error(s), {warnings} warning(s)",
            docs.len()
        );
        if failed > 0 {
            bail!("{failed} file(s) failed to check");
        }
        Ok(())
    }
}
