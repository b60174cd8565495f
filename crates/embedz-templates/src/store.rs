//! Named template fragments and the shared preamble

use indexmap::IndexMap;

/// Fragments saved by earlier blocks, plus the control-structure preamble
/// every later render starts with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateStore {
    fragments: IndexMap<String, String>,
    preamble: String,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a fragment under `name`, returning true when an earlier fragment
    /// of the same name was replaced. A body that defines macros is also
    /// appended to the preamble.
    pub fn save_fragment(&mut self, name: &str, body: &str) -> bool {
        let replaced = self
            .fragments
            .insert(name.to_string(), body.to_string())
            .is_some();
        if defines_macros(body) {
            tracing::debug!(fragment = %name, "fragment macros added to preamble");
            self.push_preamble(body);
        }
        replaced
    }

    pub fn fragment(&self, name: &str) -> Option<&str> {
        self.fragments.get(name).map(String::as_str)
    }

    pub fn fragments(&self) -> &IndexMap<String, String> {
        &self.fragments
    }

    /// Append explicit preamble text. Blank text is ignored.
    pub fn add_preamble(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.push_preamble(text);
        }
    }

    fn push_preamble(&mut self, text: &str) {
        self.preamble.push_str(text);
        self.preamble.push('\n');
    }

    pub fn preamble(&self) -> &str {
        &self.preamble
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
        self.preamble.clear();
    }
}

fn defines_macros(body: &str) -> bool {
    body.contains("{%") && body.contains("macro")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overwrite_is_reported() {
        let mut store = TemplateStore::new();
        assert!(!store.save_fragment("row", "{{ a }}"));
        assert!(store.save_fragment("row", "{{ b }}"));
        assert_eq!(store.fragment("row"), Some("{{ b }}"));
    }

    #[test]
    fn test_macro_fragment_joins_preamble() {
        let mut store = TemplateStore::new();
        store.save_fragment("plain", "{{ x }}");
        assert_eq!(store.preamble(), "");
        store.save_fragment("m", "{% macro hi(n) %}Hi {{ n }}{% endmacro %}");
        assert_eq!(store.preamble(), "{% macro hi(n) %}Hi {{ n }}{% endmacro %}\n");
    }

    #[test]
    fn test_blank_preamble_ignored() {
        let mut store = TemplateStore::new();
        store.add_preamble("  \n");
        assert_eq!(store.preamble(), "");
        store.add_preamble("{% set x = 1 %}");
        store.clear();
        assert_eq!(store.preamble(), "");
        assert!(store.fragments().is_empty());
    }
}
