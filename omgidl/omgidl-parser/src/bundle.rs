//! Multi-section IDL schema bundles.
//!
//! A `ros2idl` MCAP schema blob may concatenate several IDL files, separated
//! by `====` lines, each section starting with an `IDL: <path>` header:
//!
//! ```text
//! ================================================================================
//! IDL: geometry_msgs/msg/Point
//! module geometry_msgs { module msg { struct Point { double x; }; }; };
//! ================================================================================
//! IDL: std_msgs/msg/Header
//! module std_msgs { module msg { struct Header { string frame_id; }; }; };
//! ```
//!
//! [`SchemaBundle::parse`] splits such text into [`IdlSection`]s and
//! [`SchemaBundle::main_type`] picks the section naming the channel's type.
//! [`normalized_text`] blanks the separators and headers so the whole blob can
//! be parsed as one compilation unit with spans still pointing at the
//! original lines.

/// Error returned by [`SchemaBundle::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    #[error("no IDL sections found for schema '{schema_name}'")]
    NoSections { schema_name: String },

    #[error("line {line}: missing `IDL:` header, found `{found}`")]
    MissingHeader { line: u32, found: String },

    #[error("line {line}: empty IDL path in section header")]
    EmptyPath { line: u32 },
}

/// One IDL section extracted from a schema bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlSection {
    /// Path components from the `IDL: pkg/msg/Type` header line.
    pub idl_path: Vec<String>,
    /// 1-based line of the header in the bundle text.
    pub header_line: u32,
    /// Raw IDL text after the header, up to the next separator.
    pub body: String,
}

/// Sections of a single schema blob, in order of appearance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaBundle {
    pub sections: Vec<IdlSection>,
}

impl SchemaBundle {
    /// Split a schema blob into its `====`-separated sections.
    ///
    /// Text without any separator is a single section only if it carries an
    /// `IDL:` header; otherwise this fails with [`BundleError::MissingHeader`].
    pub fn parse(schema_name: &str, schema_text: &str) -> Result<Self, BundleError> {
        let mut sections = Vec::new();
        let mut buf: Vec<(u32, &str)> = Vec::new();

        for (idx, line) in schema_text.lines().enumerate() {
            if is_separator_line(line) {
                if has_meaningful_lines(&buf) {
                    sections.push(parse_section(&buf)?);
                }
                buf.clear();
                continue;
            }
            buf.push((idx as u32 + 1, line));
        }
        if has_meaningful_lines(&buf) {
            sections.push(parse_section(&buf)?);
        }

        if sections.is_empty() {
            return Err(BundleError::NoSections {
                schema_name: schema_name.to_string(),
            });
        }
        Ok(Self { sections })
    }

    /// `true` when `text` contains at least one separator line.
    pub fn is_bundle(text: &str) -> bool {
        text.lines().any(is_separator_line)
    }

    /// Path of the section matching `schema_name` (`pkg/msg/Type`), falling
    /// back to the first section for single-section bundles.
    pub fn main_type(&self, schema_name: &str) -> Option<Vec<String>> {
        let key = split_path(schema_name);
        if !key.is_empty()
            && let Some(section) = self.sections.iter().find(|s| s.idl_path == key)
        {
            return Some(section.idl_path.clone());
        }
        self.sections.first().map(|s| s.idl_path.clone())
    }
}

/// Replace separator and `IDL:` header lines with spaces of equal byte
/// length. Byte offsets and line numbers of the remaining IDL text are
/// unchanged.
pub fn normalized_text(schema_text: &str) -> String {
    let mut out = String::with_capacity(schema_text.len());
    let mut expect_header = true;
    for line in schema_text.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        let ending = &line[content.len()..];
        let trimmed = content.trim();
        let blank = if is_separator_line(content) {
            expect_header = true;
            true
        } else if expect_header && !trimmed.is_empty() {
            expect_header = false;
            trimmed.starts_with("IDL:")
        } else {
            false
        };
        if blank {
            out.extend(std::iter::repeat_n(' ', content.len()));
        } else {
            out.push_str(content);
        }
        out.push_str(ending);
    }
    out
}

fn is_separator_line(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.chars().all(|c| c == '=')
}

fn split_path(name: &str) -> Vec<String> {
    name.split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn has_meaningful_lines(lines: &[(u32, &str)]) -> bool {
    lines.iter().any(|(_, l)| !l.trim().is_empty())
}

/// The first non-empty line of a section must be an `IDL: <path>` header.
fn parse_section(lines: &[(u32, &str)]) -> Result<IdlSection, BundleError> {
    let mut it = lines.iter().skip_while(|(_, l)| l.trim().is_empty());
    let Some(&(header_line, header)) = it.next() else {
        return Err(BundleError::NoSections {
            schema_name: String::new(),
        });
    };
    let header = header.trim();
    let path = header
        .strip_prefix("IDL:")
        .ok_or_else(|| BundleError::MissingHeader {
            line: header_line,
            found: header.to_string(),
        })?
        .trim();
    if path.is_empty() {
        return Err(BundleError::EmptyPath { line: header_line });
    }

    let body = it.map(|(_, l)| *l).collect::<Vec<_>>().join("\n");
    Ok(IdlSection {
        idl_path: split_path(path),
        header_line,
        body,
    })
}
