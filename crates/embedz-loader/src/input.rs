use embedz_core::{EmbedzError, Result, validate_file_path};
use std::path::{Path, PathBuf};

/// Where a loader reads from
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// A file on disk
    File(PathBuf),
    /// Literal text: inline block data, a multi-line table entry or stdin
    Inline(String),
}

impl Input {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Input::File(path.into())
    }

    pub fn inline(text: impl Into<String>) -> Self {
        Input::Inline(text.into())
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Input::Inline(_))
    }

    /// Human-readable description for diagnostics
    pub fn describe(&self) -> String {
        match self {
            Input::File(path) => path.display().to_string(),
            Input::Inline(_) => "<inline>".to_string(),
        }
    }

    /// Read the full text of the source
    pub fn read_text(&self) -> Result<String> {
        match self {
            Input::Inline(text) => Ok(text.clone()),
            Input::File(path) => {
                let path = checked_path(path)?;
                tracing::debug!(path = %path.display(), "reading data file");
                Ok(std::fs::read_to_string(&path)?)
            }
        }
    }
}

/// Validate a file input and return its canonical path
pub(crate) fn checked_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_str().ok_or_else(|| {
        EmbedzError::Configuration(format!("Path is not valid UTF-8: {}", path.display()))
    })?;
    validate_file_path(raw)
}
