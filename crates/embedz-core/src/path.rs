//! Dotted-path access into nested mappings

use crate::error::{EmbedzError, Result};
use crate::value::{Mapping, Value};

/// Resolve `a.b.c` against a mapping. Numeric segments index into lists.
pub fn lookup_path<'a>(root: &'a Mapping, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root.get(first)?;
    for segment in segments {
        current = match current {
            Value::Map(map) => map.get(segment)?,
            Value::List(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Assign `value` at a dotted path, creating intermediate mappings as needed.
///
/// Descending through an existing non-mapping value is an error naming the
/// offending segment.
pub fn assign_path(root: &mut Mapping, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(EmbedzError::Configuration(format!(
            "Invalid variable path '{}'",
            path
        )));
    }

    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(()),
    };

    let mut current = root;
    for segment in parents {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Map(Mapping::new()));
        current = match entry {
            Value::Map(map) => map,
            _ => {
                return Err(EmbedzError::PathNotMapping {
                    path: path.to_string(),
                    segment: segment.to_string(),
                });
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}
