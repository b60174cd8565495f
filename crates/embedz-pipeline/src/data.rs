//! Resolving a block's data source to loaded data

use embedz_config::BlockConfig;
use embedz_core::{EmbedzError, Result, Value, validate_file_path};
use embedz_loader::{Input, LoadOptions, LoaderRegistry, query_value, resolve_reference};

use crate::state::EmbedzState;

/// Marker for standard input as a data source
pub const STDIN_SOURCE: &str = "-";

/// Short description of a block's data source for diagnostics
pub(crate) fn describe_source(config: &BlockConfig) -> Option<String> {
    match config.data()? {
        Value::String(source) if source.contains('\n') => Some("<inline text>".to_string()),
        Value::String(source) if source == STDIN_SOURCE => Some("<stdin>".to_string()),
        Value::String(source) => Some(source.clone()),
        Value::Map(tables) => Some(format!(
            "tables: {}",
            tables.keys().cloned().collect::<Vec<_>>().join(", ")
        )),
        other => Some(other.to_string()),
    }
}

/// Load the data for one block.
///
/// In order: a multi-table mapping, a reference to a stored mapping or list,
/// standard input, literal multi-line text, a file path. Without a `data`
/// key the inline data section is used. `None` means the block has no data.
#[tracing::instrument(skip_all, fields(source = ?describe_source(config)))]
pub(crate) fn load_block_data(
    registry: &LoaderRegistry,
    state: &mut EmbedzState,
    config: &BlockConfig,
    inline_data: Option<&str>,
    options: &LoadOptions,
) -> Result<Option<Value>> {
    let format = config.format();

    let Some(source) = config.data() else {
        return match inline_data {
            Some(text) => registry
                .load(&Input::inline(text), format, options)
                .map(Some),
            None => Ok(None),
        };
    };

    let loaded = match source {
        Value::Map(entries) => registry.load_tables(entries, format, options, &state.globals)?,
        Value::String(source) => {
            if let Some(stored) = resolve_reference(&state.globals, source) {
                tracing::debug!(reference = %source, "using stored data");
                match options.query.as_deref().filter(|q| !q.trim().is_empty()) {
                    Some(query) => query_value(stored, query)?,
                    None => stored.clone(),
                }
            } else if source == STDIN_SOURCE {
                let text = state.take_stdin()?;
                registry.load(&Input::inline(text), format, options)?
            } else if source.contains('\n') {
                registry.load(&Input::inline(source.as_str()), format, options)?
            } else {
                let path = validate_file_path(source)?;
                registry.load(&Input::file(path), format, options)?
            }
        }
        other => {
            return Err(EmbedzError::invalid_type(
                "data",
                format!("a string or mapping, got {}", other.type_name()),
            ));
        }
    };
    Ok(Some(loaded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedz_core::Mapping;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn config(pairs: &[(&str, Value)]) -> BlockConfig {
        BlockConfig::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<Mapping>(),
        )
    }

    fn row(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn test_no_source_no_data() {
        let mut state = EmbedzState::new();
        let loaded = load_block_data(
            &LoaderRegistry::with_defaults(),
            &mut state,
            &BlockConfig::default(),
            None,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(loaded, None);
    }

    #[test]
    fn test_inline_data_defaults_to_csv() {
        let mut state = EmbedzState::new();
        let loaded = load_block_data(
            &LoaderRegistry::with_defaults(),
            &mut state,
            &BlockConfig::default(),
            Some("name,n\nA,1"),
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(
            loaded,
            Some(Value::List(vec![row(&[
                ("name", Value::from("A")),
                ("n", Value::Int(1))
            ])]))
        );
    }

    #[test]
    fn test_reference_with_query() {
        let mut state = EmbedzState::new();
        state.globals.insert(
            "sales".into(),
            Value::List(vec![
                row(&[("region", Value::from("east")), ("v", Value::Int(3))]),
                row(&[("region", Value::from("west")), ("v", Value::Int(5))]),
            ]),
        );
        let options = LoadOptions {
            query: Some("SELECT region FROM data WHERE v > 4".into()),
            ..LoadOptions::default()
        };
        let loaded = load_block_data(
            &LoaderRegistry::with_defaults(),
            &mut state,
            &config(&[("data", Value::from("sales"))]),
            None,
            &options,
        )
        .unwrap();
        assert_eq!(
            loaded,
            Some(Value::List(vec![row(&[("region", Value::from("west"))])]))
        );
    }

    #[test]
    fn test_stdin_source() {
        let mut state = EmbedzState::with_stdin_text("[1, 2]");
        let block = config(&[("data", Value::from("-")), ("format", Value::from("json"))]);
        let registry = LoaderRegistry::with_defaults();
        let loaded =
            load_block_data(&registry, &mut state, &block, None, &LoadOptions::default()).unwrap();
        assert_eq!(loaded, Some(Value::List(vec![Value::Int(1), Value::Int(2)])));

        let err = load_block_data(&registry, &mut state, &block, None, &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, EmbedzError::Data(_)));
    }

    #[test]
    fn test_file_source_and_missing_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"title": "Report"}}"#).unwrap();
        let mut state = EmbedzState::new();
        let registry = LoaderRegistry::with_defaults();

        let path = file.path().to_string_lossy().to_string();
        let loaded = load_block_data(
            &registry,
            &mut state,
            &config(&[("data", Value::from(path))]),
            None,
            &LoadOptions::default(),
        )
        .unwrap();
        assert_eq!(loaded, Some(row(&[("title", Value::from("Report"))])));

        let err = load_block_data(
            &registry,
            &mut state,
            &config(&[("data", Value::from("missing.csv"))]),
            None,
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EmbedzError::FileNotFound(_)));
    }

    #[test]
    fn test_describe_source() {
        assert_eq!(describe_source(&BlockConfig::default()), None);
        assert_eq!(
            describe_source(&config(&[("data", Value::from("-"))])).as_deref(),
            Some("<stdin>")
        );
    }
}
