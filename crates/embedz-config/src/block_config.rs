use embedz_core::{Mapping, Value};
use embedz_loader::{Format, LoadOptions};

/// Validated configuration of one block with typed accessors over the
/// recognised keys. Unrecognised keys stay reachable through [`get`].
///
/// [`get`]: BlockConfig::get
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockConfig {
    values: Mapping,
}

impl BlockConfig {
    pub fn new(values: Mapping) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn as_mapping(&self) -> &Mapping {
        &self.values
    }

    fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
    }

    fn map_value(&self, key: &str) -> Option<&Mapping> {
        self.values.get(key).and_then(Value::as_map)
    }

    /// Name this block's template is saved under
    pub fn fragment_name(&self) -> Option<&str> {
        self.str_value("name")
    }

    /// Saved fragment this block renders with
    pub fn fragment_ref(&self) -> Option<&str> {
        self.str_value("as")
    }

    pub fn data(&self) -> Option<&Value> {
        self.values.get("data").filter(|v| match v {
            Value::String(s) => !s.is_empty(),
            other => !other.is_null(),
        })
    }

    pub fn format_name(&self) -> Option<&str> {
        self.str_value("format")
    }

    pub fn format(&self) -> Option<Format> {
        self.format_name().and_then(Format::from_name)
    }

    pub fn header(&self) -> bool {
        self.values
            .get("header")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Local variables from `with`
    pub fn with_vars(&self) -> Mapping {
        self.map_value("with").cloned().unwrap_or_default()
    }

    pub fn global(&self) -> Option<&Mapping> {
        self.map_value("global")
    }

    pub fn bind(&self) -> Option<&Mapping> {
        self.map_value("bind")
    }

    pub fn alias(&self) -> Option<&Mapping> {
        self.map_value("alias")
    }

    pub fn preamble(&self) -> Option<&str> {
        self.values.get("preamble").and_then(Value::as_str)
    }

    pub fn query(&self) -> Option<&str> {
        self.str_value("query")
    }

    pub fn table(&self) -> Option<&str> {
        self.str_value("table")
    }

    pub fn columns(&self) -> Option<usize> {
        self.values
            .get("columns")
            .and_then(Value::as_i64)
            .and_then(|n| usize::try_from(n).ok())
    }

    /// Loader options; the query is passed in because it may have been
    /// template-expanded.
    pub fn load_options(&self, query: Option<String>) -> LoadOptions {
        LoadOptions {
            header: self.header(),
            query,
            table: self.table().map(str::to_string),
            columns: self.columns(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlockConfig::default();
        assert!(config.header());
        assert!(config.with_vars().is_empty());
        assert_eq!(config.data(), None);
        assert_eq!(config.format(), None);
    }

    #[test]
    fn test_empty_data_counts_as_absent() {
        let mut config = BlockConfig::default();
        config.set("data", Value::from(""));
        assert_eq!(config.data(), None);
        config.set("data", Value::from("x.csv"));
        assert_eq!(config.data(), Some(&Value::from("x.csv")));
    }

    #[test]
    fn test_load_options() {
        let mut config = BlockConfig::default();
        config.set("header", Value::Bool(false));
        config.set("columns", Value::Int(3));
        config.set("table", Value::from("items"));
        let options = config.load_options(Some("SELECT 1".into()));
        assert!(!options.header);
        assert_eq!(options.columns, Some(3));
        assert_eq!(options.table.as_deref(), Some("items"));
        assert_eq!(options.query.as_deref(), Some("SELECT 1"));
    }
}
