use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Args;
use omgidl::{
    ParseOptions,
    core::format_specification,
    parse_with,
    parser::{SchemaBundle, normalized_text},
    semantic::format_type_model,
};

use crate::report::{ColorMode, Reporter};

#[derive(Args)]
pub struct PrintArgs {
    /// Path to the IDL file
    input: PathBuf,

    /// Print the type model instead of the syntax tree
    #[arg(long)]
    model: bool,

    /// Input is a ros2idl schema bundle (`====` separated sections)
    #[arg(long)]
    bundle: bool,

    /// Output file path (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl PrintArgs {
    pub fn run(self) -> Result<()> {
        let name = self.input.display().to_string();
        let text = fs::read_to_string(&self.input)
            .with_context(|| format!("failed to read {name}"))?;
        let text = if self.bundle {
            let bundle = SchemaBundle::parse(&name, &text)?;
            for section in &bundle.sections {
                eprintln!(
                    "section {} (line {})",
                    section.idl_path.join("/"),
                    section.header_line
                );
            }
            normalized_text(&text)
        } else {
            text
        };

        let options = ParseOptions::builder().with_cache(false).build();
        let doc = parse_with(&text, &options);
        if !doc.diagnostics.is_empty() {
            Reporter::new(ColorMode::Auto).emit_all(&name, doc.source(), doc.diagnostics.iter())?;
        }
        if doc.has_errors() {
            bail!("{name} has {} error(s)", doc.diagnostics.error_count());
        }

        let out = if self.model {
            format_type_model(&doc.model)?
        } else {
            format_specification(&doc.specification)?
        };
        match self.output {
            Some(path) => fs::write(path, out)?,
            None => print!("{out}"),
        }
        Ok(())
    }
}
