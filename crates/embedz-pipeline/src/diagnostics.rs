//! Failure reporting and user-facing notices

use embedz_core::{EmbedzError, ErrorCategory, Mapping};
use std::io::Write;
use std::sync::{Arc, Mutex};

const RULE_WIDTH: usize = 60;
const INLINE_PREVIEW_LIMIT: usize = 500;
const ISSUES_URL: &str = "https://github.com/tecolicom/pandoc-embedz/issues";

/// Environment variable selecting [`FailureMode::Propagate`]
pub const TEST_MODE_ENV: &str = "PANDOC_EMBEDZ_TEST";

/// What happens after a recognized error has been reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Return the error to the caller
    Propagate,
    /// Terminate the process with status 1
    Exit,
}

impl FailureMode {
    /// `Propagate` when `PANDOC_EMBEDZ_TEST` is set, `Exit` otherwise
    pub fn from_env() -> Self {
        match std::env::var_os(TEST_MODE_ENV) {
            Some(value) if !value.is_empty() => FailureMode::Propagate,
            _ => FailureMode::Exit,
        }
    }
}

/// Where notices and failure reports are written
pub type DiagnosticSink = Box<dyn Write + Send>;

/// In-memory sink whose contents stay readable after it is handed over
#[derive(Debug, Clone, Default)]
pub struct MemorySink(Arc<Mutex<Vec<u8>>>);

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        match self.0.lock() {
            Ok(buffer) => String::from_utf8_lossy(&buffer).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut buffer = self
            .0
            .lock()
            .map_err(|_| std::io::Error::other("diagnostic buffer poisoned"))?;
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// What was known about a block when it failed
#[derive(Debug, Clone, Default)]
pub struct FailureContext {
    pub config: Option<Mapping>,
    pub data_source: Option<String>,
    pub format: Option<String>,
    pub header: Option<bool>,
    pub template_name: Option<String>,
    pub inline_data: Option<String>,
}

fn rule(ch: char) -> String {
    std::iter::repeat_n(ch, RULE_WIDTH).collect()
}

fn hint(error: &EmbedzError) -> Option<String> {
    let lines: &[&str] = match error {
        EmbedzError::Parse(_) => &[
            "Hint: Data parsing failed. Common causes:",
            "  - SSV format with spaces in field values",
            "  - Inconsistent number of fields",
            "  - Try using 'tsv' or 'csv' format instead",
        ],
        EmbedzError::FileNotFound(path) => {
            return Some(format!(
                "Hint: Data file not found.\n  - Check the file path: {}\n  \
                 - Use relative paths from the directory pandoc is run in\n",
                path
            ));
        }
        _ => match error.category() {
            ErrorCategory::Template => &[
                "Hint: Template issue.",
                "  - Check template syntax",
                "  - Ensure referenced templates are defined first",
            ],
            ErrorCategory::Configuration => &[
                "Hint: Configuration issue.",
                "  - Check the block attributes and the YAML front matter",
            ],
            _ => return None,
        },
    };
    let mut text = lines.join("\n");
    text.push('\n');
    Some(text)
}

/// Detailed report for a recognized error
pub fn failure_report(error: &EmbedzError, context: &FailureContext) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str(&format!("{}\npandoc-embedz Error\n{}\n", rule('='), rule('=')));
    out.push_str(&format!("Error: {}\n", error));

    if let Some(hint) = hint(error) {
        out.push('\n');
        out.push_str(&hint);
    }

    out.push_str("\nConfig:\n");
    out.push_str(&format!(
        "  Data file: {}\n",
        context.data_source.as_deref().unwrap_or("inline")
    ));
    out.push_str(&format!(
        "  Format: {}\n",
        context.format.as_deref().unwrap_or("auto-detect")
    ));
    out.push_str(&format!("  Header: {}\n", context.header.unwrap_or(true)));
    out.push_str(&format!(
        "  Template: {}\n",
        context.template_name.as_deref().unwrap_or("inline")
    ));

    if let Some(config) = context.config.as_ref().filter(|c| !c.is_empty())
        && let Ok(yaml) = serde_yaml::to_string(config)
    {
        out.push_str("\nBlock configuration:\n");
        for line in yaml.lines() {
            out.push_str(&format!("  {}\n", line));
        }
    }

    if let Some(data) = context
        .inline_data
        .as_deref()
        .filter(|data| data.len() < INLINE_PREVIEW_LIMIT)
    {
        out.push_str(&format!("\nInline data:\n{}\n{}\n{}\n", rule('-'), data, rule('-')));
    }

    out.push_str("\nFor more information, see the documentation.\n");
    out.push_str(&format!("{}\n\n", rule('=')));
    out
}

/// Short report for an error nobody anticipated
pub fn bug_report(error: &EmbedzError) -> String {
    format!(
        "\n{rule}\npandoc-embedz: Unexpected Error\n{rule}\nError: {error}\n\
         This may be a bug. Please report at:\n{url}\n{rule}\n\n",
        rule = rule('='),
        error = error,
        url = ISSUES_URL
    )
}
