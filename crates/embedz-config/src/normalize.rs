//! Alias key normalisation

use embedz_core::{EmbedzError, Mapping, Result};

/// A canonical configuration key and the alias users are encouraged to write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyAlias {
    /// Internal name the rest of the pipeline reads
    pub canonical: &'static str,
    /// Preferred spelling, mapped to `canonical` silently
    pub preferred: &'static str,
    /// Whether writing `canonical` directly is deprecated
    pub deprecated: bool,
}

pub const KEY_ALIASES: &[KeyAlias] = &[
    KeyAlias {
        canonical: "name",
        preferred: "define",
        deprecated: true,
    },
    KeyAlias {
        canonical: "as",
        preferred: "template",
        deprecated: false,
    },
];

/// Rewrite preferred aliases to their canonical keys.
///
/// Deprecated canonical spellings push a notice. Supplying both spellings
/// of one key is an error.
pub fn normalize_keys(mut config: Mapping, notices: &mut Vec<String>) -> Result<Mapping> {
    for alias in KEY_ALIASES {
        let has_canonical = config.contains_key(alias.canonical);
        let has_preferred = config.contains_key(alias.preferred);

        if has_canonical && has_preferred {
            return Err(EmbedzError::ConflictingKeys {
                first: alias.preferred.to_string(),
                second: alias.canonical.to_string(),
            });
        }

        if has_preferred {
            if let Some(value) = config.shift_remove(alias.preferred) {
                config.insert(alias.canonical.to_string(), value);
            }
        } else if has_canonical && alias.deprecated {
            let notice = format!(
                "'{}' is deprecated, use '{}' instead",
                alias.canonical, alias.preferred
            );
            tracing::warn!(key = alias.canonical, replacement = alias.preferred, "deprecated configuration key");
            notices.push(notice);
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedz_core::Value;

    fn config(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_define_becomes_name() {
        let mut notices = Vec::new();
        let normalized = normalize_keys(config(&[("define", "row")]), &mut notices).unwrap();
        assert_eq!(normalized["name"], Value::from("row"));
        assert!(!normalized.contains_key("define"));
        assert!(notices.is_empty());
    }

    #[test]
    fn test_as_is_not_deprecated() {
        let mut notices = Vec::new();
        normalize_keys(config(&[("as", "row")]), &mut notices).unwrap();
        assert!(notices.is_empty());
    }

    #[test]
    fn test_both_spellings_conflict() {
        let mut notices = Vec::new();
        let err = normalize_keys(config(&[("name", "a"), ("define", "b")]), &mut notices)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Conflicting parameters: 'define' and 'name' cannot both be specified \
             ('define' is an alias of 'name')"
        );
    }
}
