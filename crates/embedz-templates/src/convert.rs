//! Conversion between embedz values and engine values

use embedz_core::{Mapping, Value};
use minijinja::value::{Value as EngineValue, ValueKind};

/// Convert a value for use inside the template engine
pub fn to_engine(value: &Value) -> EngineValue {
    EngineValue::from_serialize(value)
}

/// Convert an engine value back, keeping its native type.
///
/// Undefined becomes null, mapping keys are stringified, and anything the
/// value model cannot hold is kept as its string form.
pub fn from_engine(value: &EngineValue) -> Value {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => Value::Null,
        ValueKind::Bool => Value::Bool(value.is_true()),
        ValueKind::Number => number(value),
        ValueKind::String => Value::String(value.as_str().unwrap_or_default().to_string()),
        ValueKind::Bytes => Value::String(
            value
                .as_bytes()
                .map(|b| String::from_utf8_lossy(b).into_owned())
                .unwrap_or_default(),
        ),
        ValueKind::Seq | ValueKind::Iterable => match value.try_iter() {
            Ok(items) => Value::List(items.map(|item| from_engine(&item)).collect()),
            Err(_) => Value::String(value.to_string()),
        },
        ValueKind::Map => match value.try_iter() {
            Ok(keys) => {
                let mut map = Mapping::new();
                for key in keys {
                    let item = value.get_item(&key).unwrap_or_default();
                    let name = match key.as_str() {
                        Some(s) => s.to_string(),
                        None => key.to_string(),
                    };
                    map.insert(name, from_engine(&item));
                }
                Value::Map(map)
            }
            Err(_) => Value::String(value.to_string()),
        },
        _ => Value::String(value.to_string()),
    }
}

fn number(value: &EngineValue) -> Value {
    if value.is_integer()
        && let Ok(i) = i64::try_from(value.clone())
    {
        return Value::Int(i);
    }
    match f64::try_from(value.clone()) {
        Ok(f) => Value::Float(f),
        Err(_) => Value::String(value.to_string()),
    }
}
