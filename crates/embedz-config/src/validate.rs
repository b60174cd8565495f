//! Type checks on the recognised configuration keys

use embedz_core::{EmbedzError, Mapping, Result, Value};
use embedz_loader::Format;

/// Validate typed keys in place. A `columns` given as a numeric string is
/// converted to an integer. Unrecognised keys are left alone.
pub fn validate(config: &mut Mapping) -> Result<()> {
    if let Some(format) = config.get("format") {
        match format {
            Value::String(name) if Format::from_name(name).is_some() => {}
            other => {
                return Err(EmbedzError::InvalidFormat {
                    value: other.to_string(),
                    allowed: Format::NAMES.join(", "),
                });
            }
        }
    }

    expect(config, "header", "a boolean", |v| matches!(v, Value::Bool(_)))?;
    for key in ["with", "global"] {
        expect(config, key, "a mapping of variable names to values", |v| {
            matches!(v, Value::Map(_))
        })?;
    }
    expect(config, "bind", "a mapping of variable names to expressions", |v| {
        matches!(v, Value::Map(_))
    })?;
    expect(config, "alias", "a mapping of alias names to source keys", |v| {
        v.as_map()
            .is_some_and(|m| m.values().all(|s| matches!(s, Value::String(_))))
    })?;
    for key in ["query", "table", "name", "as"] {
        expect(config, key, "a string", |v| matches!(v, Value::String(_)))?;
    }
    expect(
        config,
        "data",
        "a file path, inline text or a mapping of table names to sources",
        |v| matches!(v, Value::String(_) | Value::Map(_)),
    )?;

    if let Some(preamble) = config.get("preamble")
        && !matches!(preamble, Value::String(_))
    {
        return Err(EmbedzError::invalid_type(
            "preamble",
            format!("a string, got {}", preamble.type_name()),
        ));
    }

    if let Some(columns) = config.get("columns") {
        let count = match columns {
            Value::Int(n) => *n,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| EmbedzError::invalid_type("columns", "an integer"))?,
            _ => return Err(EmbedzError::invalid_type("columns", "an integer")),
        };
        if count < 1 {
            return Err(EmbedzError::invalid_type("columns", "a positive integer"));
        }
        config.insert("columns".to_string(), Value::Int(count));
    }

    Ok(())
}

fn expect(
    config: &Mapping,
    key: &str,
    expected: &str,
    check: impl Fn(&Value) -> bool,
) -> Result<()> {
    match config.get(key) {
        Some(value) if !check(value) => Err(EmbedzError::invalid_type(key, expected)),
        _ => Ok(()),
    }
}
