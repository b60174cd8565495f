//! Multi-table sources and references to previously bound data

use crate::format::Format;
use crate::input::Input;
use embedz_core::{EmbedzError, Mapping, Result, Value, lookup_path};

/// How one entry of a multi-table `data:` mapping is obtained
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TableSource {
    /// Data already held in the global store
    Reference(Value),
    /// Data read through a loader
    Load { input: Input, format: Format },
}

/// Whether `source` may name a stored value rather than a file.
///
/// Explicit paths (`./`, `../`, `/`, `~`), stdin (`-`) and literal
/// multi-line text never do.
pub fn is_reference_candidate(source: &str) -> bool {
    const PATH_PREFIXES: [&str; 5] = ["./", "../", "/", "~", "-"];
    !source.is_empty()
        && !source.contains('\n')
        && !PATH_PREFIXES.iter().any(|prefix| source.starts_with(prefix))
}

/// Resolve a data reference against the global store. Only mappings and
/// lists count; anything else falls through to file loading.
pub fn resolve_reference<'a>(store: &'a Mapping, source: &str) -> Option<&'a Value> {
    if !is_reference_candidate(source) {
        return None;
    }
    match lookup_path(store, source) {
        Some(value @ (Value::Map(_) | Value::List(_))) => Some(value),
        _ => None,
    }
}

pub(crate) fn normalize_entry(
    name: &str,
    entry: &Value,
    format: Option<Format>,
    references: &Mapping,
) -> Result<TableSource> {
    match entry {
        Value::Map(spec) => {
            let data = spec.get("data").ok_or_else(|| {
                EmbedzError::Configuration(format!(
                    "Inline data dict for table '{}' must have 'data' key",
                    name
                ))
            })?;
            let text = data.as_str().ok_or_else(|| {
                EmbedzError::Configuration(format!(
                    "Inline data for table '{}' must be a string, got {}",
                    name,
                    data.type_name()
                ))
            })?;
            let format = match spec.get("format") {
                None | Some(Value::Null) => Format::DEFAULT,
                Some(Value::String(name)) => Format::parse(name)?,
                Some(other) => {
                    return Err(EmbedzError::Configuration(format!(
                        "Format for table '{}' must be a string, got {}",
                        name,
                        other.type_name()
                    )));
                }
            };
            Ok(TableSource::Load {
                input: Input::inline(text),
                format,
            })
        }
        Value::String(text) if text.contains('\n') => Ok(TableSource::Load {
            input: Input::inline(text.as_str()),
            format: Format::DEFAULT,
        }),
        Value::String(source) => {
            if let Some(value) = resolve_reference(references, source) {
                tracing::debug!(table = %name, reference = %source, "table resolved from stored data");
                return Ok(TableSource::Reference(value.clone()));
            }
            Ok(TableSource::Load {
                input: Input::file(source.as_str()),
                format: format.unwrap_or_else(|| Format::from_path(source)),
            })
        }
        other => Err(EmbedzError::Configuration(format!(
            "Invalid data source for table '{}': expected a file path, inline text \
             or a mapping with 'data', got {}",
            name,
            other.type_name()
        ))),
    }
}
