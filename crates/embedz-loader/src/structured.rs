//! Object formats, raw lines and database files

use crate::LoadOptions;
use crate::input::{Input, checked_path};
use crate::sqlite::RelationalEngine;
use embedz_core::{EmbedzError, Mapping, Result, Value};

pub(crate) fn load_json(input: &Input, _options: &LoadOptions) -> Result<Value> {
    let text = input.read_text()?;
    if text.trim().is_empty() {
        return Ok(Value::List(Vec::new()));
    }
    let parsed: serde_json::Value = serde_json::from_str(&text)?;
    Ok(Value::from(parsed))
}

pub(crate) fn load_yaml(input: &Input, _options: &LoadOptions) -> Result<Value> {
    let text = input.read_text()?;
    if text.trim().is_empty() {
        return Ok(Value::List(Vec::new()));
    }
    let parsed: serde_yaml::Value = serde_yaml::from_str(&text)?;
    Ok(Value::from(parsed))
}

pub(crate) fn load_toml(input: &Input, _options: &LoadOptions) -> Result<Value> {
    let text = input.read_text()?;
    if text.trim().is_empty() {
        return Ok(Value::Map(Mapping::new()));
    }
    let parsed: toml::Table = toml::from_str(&text)?;
    Ok(Value::from(toml::Value::Table(parsed)))
}

/// Every line verbatim, empty lines included
pub(crate) fn load_lines(input: &Input, _options: &LoadOptions) -> Result<Value> {
    let text = input.read_text()?;
    Ok(Value::List(text.lines().map(Value::from).collect()))
}

pub(crate) fn load_sqlite(input: &Input, options: &LoadOptions) -> Result<Value> {
    let path = match input {
        Input::Inline(_) => {
            return Err(EmbedzError::Data(
                "SQLite format does not support inline data. \
                 Use an external .db/.sqlite/.sqlite3 file."
                    .to_string(),
            ));
        }
        Input::File(path) => checked_path(path)?,
    };

    let query = options.query.as_deref().filter(|q| !q.trim().is_empty());
    let table = options.table.as_deref().filter(|t| !t.is_empty());
    if query.is_none() && table.is_none() {
        return Err(EmbedzError::Data(
            "SQLite format requires either 'table' or 'query' parameter".to_string(),
        ));
    }

    let engine = RelationalEngine::open_read_only(&path)?;
    match (query, table) {
        (Some(query), _) => engine.query(query),
        (None, Some(table)) => engine.select_table(table),
        (None, None) => Ok(Value::List(Vec::new())),
    }
}
