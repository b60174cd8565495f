//! Blocks handed over by the host document and the host boundary

use embedz_core::{EmbedzError, Result};

/// Class marking a code block for processing
pub const EMBEDZ_CLASS: &str = "embedz";

/// A fenced code block of the host document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub text: String,
    /// `key=value` attributes in document order
    pub attributes: Vec<(String, String)>,
    pub classes: Vec<String>,
}

impl Block {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: Vec::new(),
            classes: vec![EMBEDZ_CLASS.to_string()],
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn is_embedz(&self) -> bool {
        self.classes.iter().any(|class| class == EMBEDZ_CLASS)
    }
}

/// The host document system that rendered text is handed back to
pub trait Host {
    type Node;

    /// Parse rendered text into host document nodes
    fn reparse(&mut self, text: &str) -> Result<Vec<Self::Node>>;

    fn is_code_block(&self, node: &Self::Node) -> bool;
}

fn starts_with_fence(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Output that opens with a code fence must come back from the host as a
/// code block. Anything else means the host parser rejected the fence line,
/// usually because of characters in its identifier or attributes.
pub(crate) fn check_reparse<H: Host>(host: &H, text: &str, nodes: &[H::Node]) -> Result<()> {
    if !starts_with_fence(text) {
        return Ok(());
    }
    match nodes.first() {
        Some(node) if host.is_code_block(node) => Ok(()),
        _ => {
            let fence = text.trim_start().lines().next().unwrap_or_default();
            Err(EmbedzError::HostIntegration(format!(
                "Rendered output starts with a code fence ({}) but was not parsed as a code block. \
                 Check the fence's identifier and attributes for characters the document parser \
                 does not accept (for example '.' or ':' in an id).",
                fence
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Node {
        Code,
        Para,
    }

    struct FakeHost;

    impl Host for FakeHost {
        type Node = Node;

        fn reparse(&mut self, text: &str) -> Result<Vec<Node>> {
            Ok(vec![if text.starts_with("```{.ok}") {
                Node::Code
            } else {
                Node::Para
            }])
        }

        fn is_code_block(&self, node: &Node) -> bool {
            *node == Node::Code
        }
    }

    #[test]
    fn test_fence_reparsed_as_code_passes() {
        let mut host = FakeHost;
        let text = "```{.ok}\ncode\n```\n";
        let nodes = host.reparse(text).unwrap();
        assert!(check_reparse(&host, text, &nodes).is_ok());
    }

    #[test]
    fn test_fence_reparsed_as_paragraph_fails() {
        let mut host = FakeHost;
        let text = "```{#fig:a.b}\ncode\n```\n";
        let nodes = host.reparse(text).unwrap();
        let err = check_reparse(&host, text, &nodes).unwrap_err();
        assert!(matches!(err, EmbedzError::HostIntegration(_)));
        assert!(err.to_string().contains("{#fig:a.b}"));
    }

    #[test]
    fn test_plain_text_not_checked() {
        let host = FakeHost;
        assert!(check_reparse(&host, "Hello", &[Node::Para]).is_ok());
    }

    #[test]
    fn test_block_class() {
        assert!(Block::new("x").is_embedz());
        let other = Block {
            classes: vec!["python".into()],
            ..Block::default()
        };
        assert!(!other.is_embedz());
    }
}
