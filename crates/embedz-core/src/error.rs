//! Error types for embedz

use thiserror::Error;

/// Broad classification of an [`EmbedzError`].
///
/// The orchestrator dispatches on this: the first three categories get a
/// detailed diagnostic and abort the block, the last two are reported as
/// probable bugs and always propagated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid or conflicting block configuration
    Configuration,
    /// Missing files, malformed input documents, relational engine failures
    Data,
    /// Undefined fragments and render-time failures
    Template,
    /// Output that the host re-parsed into an unexpected structure
    HostIntegration,
    /// Anything not anticipated
    Internal,
}

/// Core error type for embedz operations
#[derive(Error, Debug)]
pub enum EmbedzError {
    #[error("Invalid format: {value}. Must be one of: {allowed}")]
    InvalidFormat { value: String, allowed: String },

    #[error("'{key}' must be {expected}")]
    InvalidType { key: String, expected: String },

    #[error(
        "Conflicting parameters: '{first}' and '{second}' cannot both be specified \
         ('{first}' is an alias of '{second}')"
    )]
    ConflictingKeys { first: String, second: String },

    #[error(
        "Cannot specify both 'data' attribute and inline data. \
         Use either 'data: filename.csv' or provide inline data after '---', not both."
    )]
    DataSourceConflict,

    #[error("Cannot assign '{path}': '{segment}' is not a mapping")]
    PathNotMapping { path: String, segment: String },

    #[error("Template '{0}' not found. Define it first with define='{0}'")]
    TemplateNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("SQLite error: {0}")]
    Sqlite(String),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("{0}")]
    HostIntegration(String),

    #[error("{0}")]
    Other(String),
}

impl EmbedzError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EmbedzError::InvalidFormat { .. }
            | EmbedzError::InvalidType { .. }
            | EmbedzError::ConflictingKeys { .. }
            | EmbedzError::DataSourceConflict
            | EmbedzError::PathNotMapping { .. }
            | EmbedzError::Configuration(_) => ErrorCategory::Configuration,

            EmbedzError::FileNotFound(_)
            | EmbedzError::Io(_)
            | EmbedzError::Yaml(_)
            | EmbedzError::Json(_)
            | EmbedzError::Toml(_)
            | EmbedzError::Parse(_)
            | EmbedzError::Sqlite(_)
            | EmbedzError::Data(_)
            | EmbedzError::MissingField(_) => ErrorCategory::Data,

            EmbedzError::TemplateNotFound(_) | EmbedzError::Template(_) => {
                ErrorCategory::Template
            }

            EmbedzError::HostIntegration(_) => ErrorCategory::HostIntegration,
            EmbedzError::Other(_) => ErrorCategory::Internal,
        }
    }

    /// Whether this error belongs to a category that gets a user diagnostic
    /// rather than a bug report.
    pub fn is_recognized(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Data | ErrorCategory::Template
        )
    }

    /// Shorthand for a wrong-type error on a config key
    pub fn invalid_type(key: impl Into<String>, expected: impl Into<String>) -> Self {
        EmbedzError::InvalidType {
            key: key.into(),
            expected: expected.into(),
        }
    }
}

/// Result type alias for embedz operations
pub type Result<T> = std::result::Result<T, EmbedzError>;
