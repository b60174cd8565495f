//! Data loading for embedz blocks
//!
//! A [`LoaderRegistry`] maps each [`Format`] to a loading function. Every
//! loader turns an [`Input`] (a file on disk or literal text) into a single
//! [`Value`]: a list of records for tabular formats, or whatever document
//! shape an object format holds.
//!
//! ```text
//! Input ──► Format (explicit | extension | csv) ──► loader fn ──► Value
//!                                                       │
//!                                             query? ──► RelationalEngine
//! ```

mod delimited;
mod format;
mod input;
mod multi;
mod registry;
mod sqlite;
mod structured;
mod table;

pub use format::Format;
pub use input::Input;
pub use multi::{is_reference_candidate, resolve_reference};
pub use registry::{LoadFn, LoaderRegistry};
pub use sqlite::{RelationalEngine, quote_identifier};
pub use table::Table;

use embedz_core::{Mapping, Result, Value};

/// Options shared by all loaders. Unused options are ignored by formats that
/// do not understand them.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// First line of delimited input is a header row
    pub header: bool,
    /// SQL run over the loaded records (table `data`) or the database file
    pub query: Option<String>,
    /// Table to read from a database file
    pub table: Option<String>,
    /// Maximum number of fields per whitespace-delimited line
    pub columns: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            header: true,
            query: None,
            table: None,
            columns: None,
        }
    }
}

/// Load a single source with the built-in loaders
pub fn load(input: &Input, format: Option<Format>, options: &LoadOptions) -> Result<Value> {
    LoaderRegistry::with_defaults().load(input, format, options)
}

/// Load a mapping of logical table names to sources with the built-in loaders
pub fn load_tables(
    entries: &Mapping,
    format: Option<Format>,
    options: &LoadOptions,
    references: &Mapping,
) -> Result<Value> {
    LoaderRegistry::with_defaults().load_tables(entries, format, options, references)
}

/// Run `query` over already loaded data, exposed to SQL as table `data`.
///
/// A mapping is flattened to the list of its values first, so a bound
/// `{id: record}` index can be queried like the records it was built from.
pub fn query_value(value: &Value, query: &str) -> Result<Value> {
    let records = match value {
        Value::Map(map) => Value::List(map.values().cloned().collect()),
        other => other.clone(),
    };
    let table = Table::from_value("data", &records)?;
    if table.has_no_columns() {
        tracing::debug!("query over empty data");
        return Ok(Value::List(Vec::new()));
    }
    let engine = RelationalEngine::in_memory()?;
    engine.load_table("data", &table)?;
    engine.query(query)
}
