use embedz_core::{Mapping, Value};

/// Convert block attributes into configuration.
///
/// A dot in a key nests one level (`with.title` becomes `{with: {title}}`,
/// split on the first dot only). The strings `true`/`false` in any case
/// become booleans; every other value stays a string.
pub fn parse_attributes(attributes: &[(String, String)]) -> Mapping {
    let mut config = Mapping::new();
    let mut nested: Mapping = Mapping::new();

    for (key, raw) in attributes {
        let value = coerce(raw);
        match key.split_once('.') {
            Some((main, sub)) => {
                let entry = nested
                    .entry(main.to_string())
                    .or_insert_with(|| Value::Map(Mapping::new()));
                if let Value::Map(group) = entry {
                    group.insert(sub.to_string(), value);
                }
            }
            None => {
                config.insert(key.clone(), value);
            }
        }
    }

    for (main, group) in nested {
        config.insert(main, group);
    }
    config
}

fn coerce(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::from(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_dot_keys_nest_one_level() {
        let config = parse_attributes(&attrs(&[
            ("with.title", "Report"),
            ("global.author", "Ann"),
            ("with.meta.year", "2024"),
        ]));
        let with = config["with"].as_map().unwrap();
        assert_eq!(with["title"], Value::from("Report"));
        assert_eq!(with["meta.year"], Value::from("2024"));
        assert_eq!(config["global"].as_map().unwrap()["author"], Value::from("Ann"));
    }

    #[test]
    fn test_boolean_coercion() {
        let config = parse_attributes(&attrs(&[
            ("header", "False"),
            ("with.show", "TRUE"),
            ("label", "yes"),
        ]));
        assert_eq!(config["header"], Value::Bool(false));
        assert_eq!(config["with"].as_map().unwrap()["show"], Value::Bool(true));
        assert_eq!(config["label"], Value::from("yes"));
    }

    #[test]
    fn test_numbers_stay_strings() {
        let config = parse_attributes(&attrs(&[("columns", "3")]));
        assert_eq!(config["columns"], Value::from("3"));
    }
}
