//! Recursive mapping merge

use crate::value::{Mapping, Value};

/// Merge `updates` on top of `base` without mutating either input.
///
/// Scalar and list values in `updates` replace those in `base`; when both
/// sides hold a mapping for the same key the merge recurses.
pub fn deep_merge(base: &Mapping, updates: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (key, value) in updates {
        let next = match (merged.get(key), value) {
            (Some(Value::Map(existing)), Value::Map(incoming)) => {
                Value::Map(deep_merge(existing, incoming))
            }
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    merged
}
