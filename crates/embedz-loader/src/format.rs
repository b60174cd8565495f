use embedz_core::{EmbedzError, Result};
use std::fmt;
use std::path::Path;

/// Data formats understood by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Csv,
    Tsv,
    /// Whitespace separated; runs of whitespace are one separator
    Ssv,
    Json,
    Yaml,
    Toml,
    Sqlite,
    Lines,
}

impl Format {
    /// Every accepted format name, aliases included, sorted
    pub const NAMES: &'static [&'static str] = &[
        "csv", "json", "lines", "spaces", "sqlite", "ssv", "toml", "tsv", "yaml",
    ];

    pub const DEFAULT: Format = Format::Csv;

    /// Parse a format name. `spaces` is an alias of `ssv`.
    pub fn from_name(name: &str) -> Option<Format> {
        match name {
            "csv" => Some(Format::Csv),
            "tsv" => Some(Format::Tsv),
            "ssv" | "spaces" => Some(Format::Ssv),
            "json" => Some(Format::Json),
            "yaml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            "sqlite" => Some(Format::Sqlite),
            "lines" => Some(Format::Lines),
            _ => None,
        }
    }

    /// Parse a format name, failing with the list of accepted names
    pub fn parse(name: &str) -> Result<Format> {
        Format::from_name(name).ok_or_else(|| EmbedzError::InvalidFormat {
            value: name.to_string(),
            allowed: Format::NAMES.join(", "),
        })
    }

    /// Guess a format from a file extension, defaulting to csv
    pub fn from_path(path: impl AsRef<Path>) -> Format {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("txt") => Format::Lines,
            Some("tsv") => Format::Tsv,
            Some("json") => Format::Json,
            Some("yaml") | Some("yml") => Format::Yaml,
            Some("toml") => Format::Toml,
            Some("db") | Some("sqlite") | Some("sqlite3") => Format::Sqlite,
            _ => Format::DEFAULT,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Tsv => "tsv",
            Format::Ssv => "ssv",
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
            Format::Sqlite => "sqlite",
            Format::Lines => "lines",
        }
    }

    /// Formats parsed as delimited rows
    pub fn is_delimited(&self) -> bool {
        matches!(self, Format::Csv | Format::Tsv | Format::Ssv)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
