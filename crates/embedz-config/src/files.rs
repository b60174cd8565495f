//! External configuration files and the three-source merge

use embedz_core::{EmbedzError, Mapping, Result, Value, deep_merge, validate_file_path};
use serde::Deserialize;
use std::path::PathBuf;

/// Normalise a `config` value into a list of file paths
pub fn config_references(value: &Value) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(path) => Ok(vec![path.clone()]),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    EmbedzError::invalid_type("config", "a list of file paths (strings)")
                })
            })
            .collect(),
        _ => Err(EmbedzError::invalid_type(
            "config",
            "a string or list of strings",
        )),
    }
}

/// Load a YAML config file. Multiple documents are deep-merged in order;
/// every non-empty document must be a mapping. A `config` key inside the
/// file names further files, loaded first so the including file wins; the
/// key itself is dropped.
#[tracing::instrument]
pub fn load_config_file(path: &str) -> Result<Mapping> {
    load_nested(path, &mut Vec::new())
}

fn load_nested(path: &str, including: &mut Vec<PathBuf>) -> Result<Mapping> {
    let validated = validate_file_path(path)?;
    let identity = std::fs::canonicalize(&validated).unwrap_or_else(|_| validated.clone());
    if including.contains(&identity) {
        return Err(EmbedzError::Configuration(format!(
            "Config file '{}' includes itself through 'config'",
            path
        )));
    }
    let text = std::fs::read_to_string(&validated)?;

    including.push(identity);
    let mut merged = Mapping::new();
    for document in serde_yaml::Deserializer::from_str(&text) {
        let parsed = serde_yaml::Value::deserialize(document)?;
        match Value::from(parsed) {
            Value::Null => {}
            Value::Map(mut mapping) => {
                if let Some(value) = mapping.shift_remove("config") {
                    for reference in config_references(&value)? {
                        tracing::debug!(from = %path, file = %reference, "following nested config");
                        merged = deep_merge(&merged, &load_nested(&reference, including)?);
                    }
                }
                merged = deep_merge(&merged, &mapping);
            }
            _ => {
                return Err(EmbedzError::Configuration(format!(
                    "Config file '{}' must contain a YAML mapping at the top level",
                    path
                )));
            }
        }
    }
    including.pop();

    tracing::debug!(keys = merged.len(), "loaded config file");
    Ok(merged)
}

/// Merge config files, attributes and front matter, in that order of
/// increasing precedence. `config` references are taken from attributes
/// first, then from front matter, and removed from the result.
pub fn merge_sources(mut attributes: Mapping, mut front_matter: Mapping) -> Result<Mapping> {
    let mut references = Vec::new();
    if let Some(value) = attributes.shift_remove("config") {
        references.extend(config_references(&value)?);
    }
    if let Some(value) = front_matter.shift_remove("config") {
        references.extend(config_references(&value)?);
    }

    let mut merged = Mapping::new();
    for reference in &references {
        merged = deep_merge(&merged, &load_config_file(reference)?);
    }
    merged = deep_merge(&merged, &attributes);
    Ok(deep_merge(&merged, &front_matter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> String {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_multi_document_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "multi.yaml",
            indoc! {"
                ---
                global:
                  this_year: 2023
                ---
                global:
                  last_year: 2022
                bind:
                  test: \"'value'\"
                ---
            "},
        );
        let config = load_config_file(&path).unwrap();
        let global = config["global"].as_map().unwrap();
        assert_eq!(global["this_year"], Value::Int(2023));
        assert_eq!(global["last_year"], Value::Int(2022));
        assert_eq!(config["bind"].as_map().unwrap()["test"], Value::from("'value'"));
    }

    #[test]
    fn test_non_mapping_document_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "list.yaml", "- a\n- b\n");
        let err = load_config_file(&path).unwrap_err();
        assert!(err.to_string().contains("must contain a YAML mapping"));
    }

    #[test]
    fn test_precedence_files_then_attributes_then_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(&dir, "a.yaml", "with:\n  x: file-a\n  y: file-a\n  z: file-a\n");
        let second = write(&dir, "b.yaml", "with:\n  y: file-b\n");

        let mut attributes = Mapping::new();
        attributes.insert("config".into(), Value::from(first));
        let mut with = Mapping::new();
        with.insert("z".into(), Value::from("attr"));
        attributes.insert("with".into(), Value::Map(with));

        let mut front_matter = Mapping::new();
        front_matter.insert("config".into(), Value::List(vec![Value::from(second)]));

        let merged = merge_sources(attributes, front_matter).unwrap();
        let with = merged["with"].as_map().unwrap();
        assert_eq!(with["x"], Value::from("file-a"));
        assert_eq!(with["y"], Value::from("file-b"));
        assert_eq!(with["z"], Value::from("attr"));
        assert!(!merged.contains_key("config"));
    }

    #[test]
    fn test_nested_config_followed_and_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let inner = write(&dir, "inner.yaml", "format: csv\nheader: false\nwith:\n  unit: kg\n");
        let outer = write(&dir, "outer.yaml", &format!("config: {}\nheader: true\n", inner));

        let mut attributes = Mapping::new();
        attributes.insert("config".into(), Value::from(outer));
        let merged = merge_sources(attributes, Mapping::new()).unwrap();

        assert!(merged.get("config").is_none());
        assert_eq!(merged["format"], Value::from("csv"));
        assert_eq!(merged["header"], Value::Bool(true));
        assert_eq!(merged["with"].as_map().unwrap()["unit"], Value::from("kg"));
    }

    #[test]
    fn test_config_cycle_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.yaml").display().to_string();
        let second = write(&dir, "second.yaml", &format!("config: {}\n", first));
        write(&dir, "first.yaml", &format!("config: [{}]\nheader: true\n", second));

        let err = load_config_file(&first).unwrap_err();
        assert!(matches!(err, EmbedzError::Configuration(_)));
        assert!(err.to_string().contains("includes itself"));
    }

    #[test]
    fn test_bad_reference_type() {
        let err = config_references(&Value::Int(3)).unwrap_err();
        assert_eq!(err.to_string(), "'config' must be a string or list of strings");
    }

    #[test]
    fn test_missing_config_file() {
        let mut attributes = Mapping::new();
        attributes.insert("config".into(), Value::from("no/such/config.yaml"));
        let err = merge_sources(attributes, Mapping::new()).unwrap_err();
        assert!(matches!(err, EmbedzError::FileNotFound(_)));
    }
}
