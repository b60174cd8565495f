use embedz_core::{EmbedzError, Mapping, Result, Value};

/// Rows with named columns, the shape handed to the relational engine
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Positional column names used when there is no header row
    pub fn positional_columns(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("column{}", i)).collect()
    }

    /// Build a table from loaded records.
    ///
    /// Lists of mappings use the union of their keys in first-seen order;
    /// lists of lists get positional column names. Missing cells are null.
    /// An empty list gives a table with no columns.
    pub fn from_value(name: &str, value: &Value) -> Result<Table> {
        let not_tabular = || {
            EmbedzError::Data(format!(
                "Data for table '{}' is not tabular: expected a list of records",
                name
            ))
        };

        let items = value.as_list().ok_or_else(not_tabular)?;
        if items.is_empty() {
            return Ok(Table::default());
        }

        if items.iter().all(|item| matches!(item, Value::Map(_))) {
            let mut columns: Vec<String> = Vec::new();
            for item in items {
                if let Value::Map(map) = item {
                    for key in map.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                }
            }
            let rows = items
                .iter()
                .filter_map(|item| item.as_map())
                .map(|map| {
                    columns
                        .iter()
                        .map(|column| map.get(column).cloned().unwrap_or(Value::Null))
                        .collect()
                })
                .collect();
            return Ok(Table::new(columns, rows));
        }

        if items.iter().all(|item| matches!(item, Value::List(_))) {
            let width = items
                .iter()
                .filter_map(|item| item.as_list())
                .map(|row| row.len())
                .max()
                .unwrap_or(0);
            let rows = items
                .iter()
                .filter_map(|item| item.as_list())
                .map(|row| {
                    let mut cells = row.clone();
                    cells.resize(width, Value::Null);
                    cells
                })
                .collect();
            return Ok(Table::new(Table::positional_columns(width), rows));
        }

        Err(not_tabular())
    }

    /// No column names are known, so the table cannot be created in SQLite
    pub fn has_no_columns(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert to records: mappings keyed by column when `header` is set,
    /// positional lists otherwise.
    pub fn into_records(self, header: bool) -> Value {
        if !header {
            return Value::List(self.rows.into_iter().map(Value::List).collect());
        }
        let columns = self.columns;
        Value::List(
            self.rows
                .into_iter()
                .map(|row| {
                    let record: Mapping = columns.iter().cloned().zip(row).collect();
                    Value::Map(record)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_union_of_keys() {
        let value = Value::List(vec![
            record(&[("a", Value::Int(1))]),
            record(&[("b", Value::Int(2)), ("a", Value::Int(3))]),
        ]);
        let table = Table::from_value("t", &value).unwrap();
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows[0], vec![Value::Int(1), Value::Null]);
        assert_eq!(table.rows[1], vec![Value::Int(3), Value::Int(2)]);
    }

    #[test]
    fn test_positional_rows_are_padded() {
        let value = Value::List(vec![
            Value::List(vec![Value::Int(1)]),
            Value::List(vec![Value::Int(2), Value::Int(3)]),
        ]);
        let table = Table::from_value("t", &value).unwrap();
        assert_eq!(table.columns, vec!["column1", "column2"]);
        assert_eq!(table.rows[0], vec![Value::Int(1), Value::Null]);
    }

    #[test]
    fn test_empty_list_has_no_columns() {
        let table = Table::from_value("t", &Value::List(Vec::new())).unwrap();
        assert!(table.has_no_columns());
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_scalar_list_rejected() {
        let value = Value::List(vec![Value::from("x")]);
        let err = Table::from_value("lines", &value).unwrap_err();
        assert!(err.to_string().contains("'lines' is not tabular"));
    }
}
