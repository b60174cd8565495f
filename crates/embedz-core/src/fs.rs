//! File path validation

use crate::error::{EmbedzError, Result};
use std::path::PathBuf;

/// Check that `file_path` names an existing regular file and return its
/// canonical form.
pub fn validate_file_path(file_path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(file_path);
    if !path.exists() {
        return Err(EmbedzError::FileNotFound(file_path.to_string()));
    }
    if !path.is_file() {
        return Err(EmbedzError::Configuration(format!(
            "Path is not a file: {}",
            file_path
        )));
    }
    path.canonicalize().map_err(|e| {
        EmbedzError::Configuration(format!("Invalid file path: {} ({})", file_path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = validate_file_path("definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, EmbedzError::FileNotFound(_)));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file_path(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("not a file"));
    }

    #[test]
    fn test_existing_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = validate_file_path(file.path().to_str().unwrap()).unwrap();
        assert!(path.is_absolute());
    }
}
