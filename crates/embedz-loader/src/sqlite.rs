//! Embedded relational engine backed by SQLite

use crate::table::Table;
use embedz_core::{EmbedzError, Mapping, Result, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, OpenFlags, params_from_iter};
use std::path::Path;

/// Quote an identifier for use in SQL, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_error(context: &str, err: rusqlite::Error) -> EmbedzError {
    EmbedzError::Sqlite(format!("{}: {}", context, err))
}

/// A SQLite connection holding temporary tables or an opened database file
pub struct RelationalEngine {
    conn: Connection,
}

impl RelationalEngine {
    /// Open an empty in-memory database for loading tables into
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| sql_error("Failed to open in-memory database", e))?;
        Ok(Self { conn })
    }

    /// Open a database file read-only
    pub fn open_read_only(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "opening SQLite database");
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|e| {
            sql_error(
                &format!("Failed to open SQLite database at '{}'", path.display()),
                e,
            )
        })?;
        Ok(Self { conn })
    }

    /// Create `name` with untyped columns and insert every row in one
    /// transaction. An existing table of the same name is replaced.
    #[tracing::instrument(skip(self, table), fields(columns = table.columns.len(), rows = table.rows.len()))]
    pub fn load_table(&self, name: &str, table: &Table) -> Result<()> {
        if table.columns.is_empty() {
            return Err(EmbedzError::Data(format!(
                "Table '{}' has no columns",
                name
            )));
        }

        let quoted = quote_identifier(name);
        let column_list = table
            .columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; table.columns.len()].join(", ");

        let tx = self
            .conn
            .unchecked_transaction()
            .map_err(|e| sql_error("Failed to begin transaction", e))?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {quoted}; CREATE TABLE {quoted} ({column_list});"
        ))
        .map_err(|e| sql_error(&format!("Failed to create table '{}'", name), e))?;
        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO {quoted} VALUES ({placeholders})"))
                .map_err(|e| sql_error("Failed to prepare insert", e))?;
            for row in &table.rows {
                let params: Vec<SqlValue> = row.iter().map(to_sql_value).collect();
                stmt.execute(params_from_iter(params.iter()))
                    .map_err(|e| sql_error(&format!("Failed to insert into '{}'", name), e))?;
            }
        }
        tx.commit()
            .map_err(|e| sql_error("Failed to commit transaction", e))?;
        Ok(())
    }

    /// Run a query and return its rows as field-keyed mappings
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn query(&self, sql: &str) -> Result<Value> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| sql_error("Failed to prepare query", e))?;
        let column_names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        let mut records = Vec::new();
        let mut rows = stmt
            .query([])
            .map_err(|e| sql_error("Failed to execute query", e))?;
        while let Some(row) = rows
            .next()
            .map_err(|e| sql_error("Failed to fetch row", e))?
        {
            let mut record = Mapping::with_capacity(column_names.len());
            for (idx, name) in column_names.iter().enumerate() {
                let cell = row
                    .get_ref(idx)
                    .map_err(|e| sql_error("Failed to read column", e))?;
                record.insert(name.clone(), from_sql_value(cell));
            }
            records.push(Value::Map(record));
        }

        tracing::debug!(row_count = records.len(), "query executed");
        Ok(Value::List(records))
    }

    /// Read every row of one table
    pub fn select_table(&self, name: &str) -> Result<Value> {
        self.query(&format!("SELECT * FROM {}", quote_identifier(name)))
    }
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::List(_) | Value::Map(_) => SqlValue::Text(value.to_string()),
    }
}

fn from_sql_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
