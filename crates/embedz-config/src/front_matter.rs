//! Splitting block text into front matter, template and inline data

use embedz_core::{EmbedzError, Mapping, Result, Value};

/// How text after the front matter is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Code block in a document: a second `---` line starts inline data
    Block,
    /// Whole template file: everything after the front matter is template
    Standalone,
}

/// The three sections of a block's text
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SplitText {
    pub front_matter: Mapping,
    pub has_front_matter: bool,
    pub template: String,
    pub inline_data: Option<String>,
}

const MARKER: &str = "---";

fn is_marker(line: &str) -> bool {
    line.trim() == MARKER
}

/// Split block text into its sections.
///
/// Block text is trimmed first; standalone text is kept verbatim. Front
/// matter without a closing marker takes the whole text and leaves the
/// template empty.
pub fn split_text(text: &str, mode: ParseMode) -> Result<SplitText> {
    let text = match mode {
        ParseMode::Block => text.trim(),
        ParseMode::Standalone => text,
    };

    let mut lines = text.split_inclusive('\n');
    match lines.next() {
        Some(first) if is_marker(first) => {}
        _ => {
            return Ok(SplitText {
                template: text.to_string(),
                ..SplitText::default()
            });
        }
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if is_marker(line) {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }

    let front_matter = parse_front_matter(yaml.trim())?;
    if !closed {
        return Ok(SplitText {
            front_matter,
            has_front_matter: true,
            ..SplitText::default()
        });
    }

    let (template, inline_data) = match mode {
        ParseMode::Standalone => (lines.collect::<String>(), None),
        ParseMode::Block => {
            let mut template = String::new();
            let mut inline_data = None;
            while let Some(line) = lines.next() {
                if is_marker(line) {
                    let data = lines.by_ref().collect::<String>().trim().to_string();
                    inline_data = (!data.is_empty()).then_some(data);
                    break;
                }
                template.push_str(line);
            }
            (template.trim_end_matches('\n').to_string(), inline_data)
        }
    };

    Ok(SplitText {
        front_matter,
        has_front_matter: true,
        template,
        inline_data,
    })
}

/// Parse front matter YAML; empty text is an empty mapping
fn parse_front_matter(yaml: &str) -> Result<Mapping> {
    match parse_mapping(yaml)? {
        Some(mapping) => Ok(mapping),
        None => Err(EmbedzError::Configuration(
            "Front matter must be a YAML mapping".to_string(),
        )),
    }
}

/// Parse YAML text as a mapping. `Ok(None)` when the document is valid
/// YAML of another shape.
pub(crate) fn parse_mapping(yaml: &str) -> Result<Option<Mapping>> {
    if yaml.trim().is_empty() {
        return Ok(Some(Mapping::new()));
    }
    let parsed: serde_yaml::Value = serde_yaml::from_str(yaml)?;
    match Value::from(parsed) {
        Value::Map(mapping) => Ok(Some(mapping)),
        Value::Null => Ok(Some(Mapping::new())),
        _ => Ok(None),
    }
}
