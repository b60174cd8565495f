//! Comma, tab and whitespace delimited text

use crate::LoadOptions;
use crate::format::Format;
use crate::input::Input;
use crate::sqlite::RelationalEngine;
use crate::table::Table;
use embedz_core::{EmbedzError, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Int,
    Float,
    Bool,
    Text,
}

/// Parse delimited text into a typed table.
///
/// With `header` the first non-blank line names the columns, otherwise
/// columns are positional. Blank lines are skipped.
pub(crate) fn parse_table(text: &str, format: Format, options: &LoadOptions) -> Result<Table> {
    let lines = match format {
        Format::Ssv => split_whitespace_rows(text, options.columns),
        Format::Tsv => split_csv_rows(text, b'\t')?,
        _ => split_csv_rows(text, b',')?,
    };

    let mut lines = lines.into_iter();
    let (columns, raw_rows): (Vec<String>, Vec<Vec<String>>) = if options.header {
        let Some((_, header)) = lines.next() else {
            return Ok(Table::default());
        };
        let columns = dedupe_columns(header);
        let mut rows = Vec::new();
        for (line, fields) in lines {
            if fields.len() != columns.len() {
                return Err(EmbedzError::Parse(format!(
                    "line {}: expected {} fields, saw {}",
                    line,
                    columns.len(),
                    fields.len()
                )));
            }
            rows.push(fields);
        }
        (columns, rows)
    } else {
        let rows: Vec<Vec<String>> = lines.map(|(_, fields)| fields).collect();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        (Table::positional_columns(width), rows)
    };

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|idx| {
            infer_column(
                raw_rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.as_str()),
            )
        })
        .collect();

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            let mut cells: Vec<Value> = row
                .iter()
                .zip(&kinds)
                .map(|(cell, kind)| convert_cell(cell, *kind))
                .collect();
            cells.resize(columns.len(), Value::Null);
            cells
        })
        .collect();

    Ok(Table::new(columns, rows))
}

/// Records from delimited text: mappings with a header, lists without
pub(crate) fn load_records(text: &str, format: Format, options: &LoadOptions) -> Result<Value> {
    Ok(parse_table(text, format, options)?.into_records(options.header))
}

pub(crate) fn load_csv(input: &Input, options: &LoadOptions) -> Result<Value> {
    load_delimited(input, Format::Csv, options)
}

pub(crate) fn load_tsv(input: &Input, options: &LoadOptions) -> Result<Value> {
    load_delimited(input, Format::Tsv, options)
}

pub(crate) fn load_ssv(input: &Input, options: &LoadOptions) -> Result<Value> {
    load_delimited(input, Format::Ssv, options)
}

/// Load delimited records, running `query` over them as table `data` when set
fn load_delimited(input: &Input, format: Format, options: &LoadOptions) -> Result<Value> {
    let text = input.read_text()?;
    match options.query.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(query) => {
            let table = parse_table(&text, format, options)?;
            let engine = RelationalEngine::in_memory()?;
            engine.load_table("data", &table)?;
            engine.query(query)
        }
        None => load_records(&text, format, options),
    }
}

fn split_csv_rows(text: &str, delimiter: u8) -> Result<Vec<(u64, Vec<String>)>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EmbedzError::Parse(e.to_string()))?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        rows.push((line, record.iter().map(|f| f.to_string()).collect()));
    }
    Ok(rows)
}

fn split_whitespace_rows(text: &str, limit: Option<usize>) -> Vec<(u64, Vec<String>)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| (idx as u64 + 1, split_fields(line, limit)))
        .collect()
}

/// Split on runs of whitespace into at most `limit` fields. The last field
/// keeps the rest of the line, internal spacing included.
fn split_fields(line: &str, limit: Option<usize>) -> Vec<String> {
    let mut fields = Vec::new();
    let mut rest = line.trim();
    while !rest.is_empty() {
        if limit.is_some_and(|n| fields.len() + 1 >= n) {
            fields.push(rest.to_string());
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                fields.push(rest[..end].to_string());
                rest = rest[end..].trim_start();
            }
            None => {
                fields.push(rest.to_string());
                break;
            }
        }
    }
    fields
}

/// Repeated header names get a `.N` suffix so every column stays addressable
fn dedupe_columns(header: Vec<String>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::with_capacity(header.len());
    for name in header {
        let name = name.trim().to_string();
        let mut candidate = name.clone();
        let mut n = 1;
        while columns.contains(&candidate) {
            candidate = format!("{}.{}", name, n);
            n += 1;
        }
        columns.push(candidate);
    }
    columns
}

fn infer_column<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind: Option<ColumnKind> = None;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        let cell_kind = classify(cell);
        kind = Some(match (kind, cell_kind) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float) | (Some(ColumnKind::Float), ColumnKind::Int) => {
                ColumnKind::Float
            }
            _ => return ColumnKind::Text,
        });
    }
    kind.unwrap_or(ColumnKind::Text)
}

fn classify(cell: &str) -> ColumnKind {
    if cell.parse::<i64>().is_ok() {
        ColumnKind::Int
    } else if is_float(cell) {
        ColumnKind::Float
    } else if cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false") {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    }
}

fn is_float(cell: &str) -> bool {
    cell.bytes().any(|b| b.is_ascii_digit()) && cell.parse::<f64>().is_ok()
}

fn convert_cell(cell: &str, kind: ColumnKind) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match kind {
        ColumnKind::Int => trimmed.parse().map(Value::Int).unwrap_or(Value::Null),
        ColumnKind::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnKind::Bool => Value::Bool(trimmed.eq_ignore_ascii_case("true")),
        ColumnKind::Text => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn opts(header: bool, columns: Option<usize>) -> LoadOptions {
        LoadOptions {
            header,
            columns,
            ..LoadOptions::default()
        }
    }

    #[test]
    fn test_csv_with_header_infers_types() {
        let text = indoc! {"
            name,value,ratio,active
            Alice,100,0.5,true

            Bob,200,1,False
        "};
        let table = parse_table(text, Format::Csv, &opts(true, None)).unwrap();
        assert_eq!(table.columns, vec!["name", "value", "ratio", "active"]);
        assert_eq!(
            table.rows[1],
            vec![
                Value::from("Bob"),
                Value::Int(200),
                Value::Float(1.0),
                Value::Bool(false)
            ]
        );
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let text = "code\n001\nA1\n";
        let records = load_records(text, Format::Csv, &opts(true, None)).unwrap();
        let first = records.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(first["code"], Value::from("001"));
    }

    #[test]
    fn test_empty_cell_is_null() {
        let text = "a,b\n1,\n2,x\n";
        let table = parse_table(text, Format::Csv, &opts(true, None)).unwrap();
        assert_eq!(table.rows[0][1], Value::Null);
        assert_eq!(table.rows[1][0], Value::Int(2));
    }

    #[test]
    fn test_headerless_rows_are_positional() {
        let text = "1,2\n3,4\n";
        let records = load_records(text, Format::Csv, &opts(false, None)).unwrap();
        assert_eq!(
            records,
            Value::List(vec![
                Value::List(vec![Value::Int(1), Value::Int(2)]),
                Value::List(vec![Value::Int(3), Value::Int(4)]),
            ])
        );
    }

    #[test]
    fn test_quoted_csv_field() {
        let text = "name,note\nAlice,\"hello, world\"\n";
        let records = load_records(text, Format::Csv, &opts(true, None)).unwrap();
        let first = records.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(first["note"], Value::from("hello, world"));
    }

    #[test]
    fn test_tsv() {
        let text = "a\tb\nx y\t2\n";
        let records = load_records(text, Format::Tsv, &opts(true, None)).unwrap();
        let first = records.as_list().unwrap()[0].as_map().unwrap();
        assert_eq!(first["a"], Value::from("x y"));
        assert_eq!(first["b"], Value::Int(2));
    }

    #[test]
    fn test_ssv_collapses_whitespace() {
        let text = "name   value\nAlice    1\n  Bob 2\n";
        let records = load_records(text, Format::Ssv, &opts(true, None)).unwrap();
        let rows = records.as_list().unwrap();
        assert_eq!(rows[1].as_map().unwrap()["name"], Value::from("Bob"));
    }

    #[test]
    fn test_ssv_columns_keeps_trailing_text() {
        let text = indoc! {"
            id  date        message
            1   2024-01-01  server restarted after   update
            2   2024-01-02  ok
        "};
        let records = load_records(text, Format::Ssv, &opts(true, Some(3))).unwrap();
        let rows = records.as_list().unwrap();
        assert_eq!(
            rows[0].as_map().unwrap()["message"],
            Value::from("server restarted after   update")
        );
        assert_eq!(rows[1].as_map().unwrap()["message"], Value::from("ok"));
    }

    #[test]
    fn test_row_width_mismatch_names_line() {
        let text = "a,b\n1,2\n3,4,5\n";
        let err = parse_table(text, Format::Csv, &opts(true, None)).unwrap_err();
        assert!(err.to_string().contains("line 3"), "{}", err);
    }

    #[test]
    fn test_duplicate_header_names() {
        let table = parse_table("a,a\n1,2\n", Format::Csv, &opts(true, None)).unwrap();
        assert_eq!(table.columns, vec!["a", "a.1"]);
    }

    #[test]
    fn test_query_over_csv() {
        let options = LoadOptions {
            query: Some("SELECT name FROM data WHERE value > 150".into()),
            ..LoadOptions::default()
        };
        let input = Input::inline("name,value\nAlice,100\nBob,200\n");
        let value = load_csv(&input, &options).unwrap();
        assert_eq!(
            value,
            Value::List(vec![Value::Map(
                [("name".to_string(), Value::from("Bob"))].into_iter().collect()
            )])
        );
    }

    #[test]
    fn test_query_over_headerless_rows_uses_positional_columns() {
        let options = LoadOptions {
            header: false,
            query: Some("SELECT column2 AS v FROM data".into()),
            ..LoadOptions::default()
        };
        let value = load_csv(&Input::inline("a,1\nb,2\n"), &options).unwrap();
        let rows = value.as_list().unwrap();
        assert_eq!(rows[1].as_map().unwrap()["v"], Value::Int(2));
    }

    #[test]
    fn test_split_fields_limit_one() {
        assert_eq!(split_fields("  a b  c ", Some(1)), vec!["a b  c"]);
        assert_eq!(split_fields("a b c", None), vec!["a", "b", "c"]);
    }
}
