//! Format loader registry

use crate::format::Format;
use crate::input::Input;
use crate::multi::{TableSource, normalize_entry};
use crate::sqlite::RelationalEngine;
use crate::table::Table;
use crate::{LoadOptions, delimited, query_value, structured};
use embedz_core::{EmbedzError, Mapping, Result, Value};
use std::collections::HashMap;

/// A loading function for one format
pub type LoadFn = fn(&Input, &LoadOptions) -> Result<Value>;

/// Registry of format loaders
pub struct LoaderRegistry {
    loaders: HashMap<Format, LoadFn>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LoaderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            loaders: HashMap::new(),
        }
    }

    /// Create a registry with all built-in loaders registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Delimited text
        registry.register(Format::Csv, delimited::load_csv);
        registry.register(Format::Tsv, delimited::load_tsv);
        registry.register(Format::Ssv, delimited::load_ssv);

        // Object formats
        registry.register(Format::Json, structured::load_json);
        registry.register(Format::Yaml, structured::load_yaml);
        registry.register(Format::Toml, structured::load_toml);

        registry.register(Format::Lines, structured::load_lines);
        registry.register(Format::Sqlite, structured::load_sqlite);

        registry
    }

    /// Register or replace the loader for a format
    pub fn register(&mut self, format: Format, loader: LoadFn) {
        tracing::debug!(format = %format, "registering data loader");
        self.loaders.insert(format, loader);
    }

    /// Get the loader for a format
    pub fn get(&self, format: Format) -> Option<LoadFn> {
        let loader = self.loaders.get(&format).copied();
        if loader.is_none() {
            tracing::warn!(format = %format, "no loader registered for format");
        }
        loader
    }

    /// Check if a format has a loader
    pub fn has(&self, format: Format) -> bool {
        self.loaders.contains_key(&format)
    }

    /// The format a source will be loaded as
    pub fn resolve_format(input: &Input, format: Option<Format>) -> Format {
        match (format, input) {
            (Some(format), _) => format,
            (None, Input::File(path)) => Format::from_path(path),
            (None, Input::Inline(_)) => Format::DEFAULT,
        }
    }

    /// Load one source. A format without a registered loader falls back to
    /// csv. A query on an object format runs over the loaded records.
    #[tracing::instrument(skip(self, input, options), fields(source = %input.describe()))]
    pub fn load(&self, input: &Input, format: Option<Format>, options: &LoadOptions) -> Result<Value> {
        let format = Self::resolve_format(input, format);
        let loader = self
            .get(format)
            .or_else(|| self.get(Format::DEFAULT))
            .ok_or_else(|| EmbedzError::Other(format!("no loader available for '{}'", format)))?;

        let value = loader(input, options)?;

        let query = options.query.as_deref().filter(|q| !q.trim().is_empty());
        match query {
            Some(query) if !format.is_delimited() && format != Format::Sqlite => {
                tracing::debug!(format = %format, "applying query to loaded records");
                query_value(&value, query)
            }
            _ => Ok(value),
        }
    }

    /// Load a mapping of logical table names to sources.
    ///
    /// Without a query the result maps each table name to its loaded data.
    /// With a query every table is loaded into one relational engine and the
    /// query result is returned.
    #[tracing::instrument(skip_all, fields(tables = entries.len()))]
    pub fn load_tables(
        &self,
        entries: &Mapping,
        format: Option<Format>,
        options: &LoadOptions,
        references: &Mapping,
    ) -> Result<Value> {
        let per_table = LoadOptions {
            query: None,
            ..options.clone()
        };
        let query = options.query.as_deref().filter(|q| !q.trim().is_empty());

        let Some(query) = query else {
            let mut datasets = Mapping::with_capacity(entries.len());
            for (name, entry) in entries {
                let value = match normalize_entry(name, entry, format, references)? {
                    TableSource::Reference(value) => value,
                    TableSource::Load { input, format } => {
                        self.load(&input, Some(format), &per_table)?
                    }
                };
                datasets.insert(name.clone(), value);
            }
            return Ok(Value::Map(datasets));
        };

        let engine = RelationalEngine::in_memory()?;
        for (name, entry) in entries {
            let table = match normalize_entry(name, entry, format, references)? {
                TableSource::Reference(value) => Table::from_value(name, &value)?,
                TableSource::Load { input, format } if format.is_delimited() => {
                    delimited::parse_table(&input.read_text()?, format, &per_table)?
                }
                TableSource::Load { input, format } => {
                    Table::from_value(name, &self.load(&input, Some(format), &per_table)?)?
                }
            };
            if table.has_no_columns() {
                tracing::debug!(table = %name, "empty table, query result is empty");
                return Ok(Value::List(Vec::new()));
            }
            tracing::debug!(table = %name, rows = table.rows.len(), "loaded table");
            engine.load_table(name, &table)?;
        }
        engine.query(query)
    }
}
