//! Per-block configuration resolution
//!
//! A block's configuration comes from three places, merged in increasing
//! precedence:
//!
//! 1. external YAML files named by `config`
//! 2. the block's attributes (`with.title=...` nests one level)
//! 3. the YAML front matter at the top of the block text
//!
//! Aliased keys are then normalised and the typed keys validated.

mod attributes;
mod block_config;
mod files;
mod front_matter;
mod normalize;
mod validate;

pub use attributes::parse_attributes;
pub use block_config::BlockConfig;
pub use files::{config_references, load_config_file, merge_sources};
pub use front_matter::{ParseMode, SplitText, split_text};
pub use normalize::{KEY_ALIASES, KeyAlias, normalize_keys};
pub use validate::validate;

use embedz_core::{EmbedzError, Mapping, Result};

/// A block's configuration, template body and inline data after resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock {
    pub config: BlockConfig,
    pub template: String,
    pub inline_data: Option<String>,
    /// User-facing notices raised while resolving, such as deprecated keys
    pub notices: Vec<String>,
}

/// Resolve a block from its raw attributes and text
pub fn resolve(attributes: &[(String, String)], text: &str, mode: ParseMode) -> Result<ResolvedBlock> {
    resolve_with(parse_attributes(attributes), text, mode)
}

/// Resolve a block whose attribute-level configuration is already a mapping
#[tracing::instrument(skip_all, fields(mode = ?mode))]
pub fn resolve_with(attr_config: Mapping, text: &str, mode: ParseMode) -> Result<ResolvedBlock> {
    let mut split = split_text(text, mode)?;

    if mode == ParseMode::Block && !split.has_front_matter && names_fragment(&attr_config) {
        apply_compat_layout(&attr_config, &mut split);
    }

    tracing::debug!(attributes = ?attr_config, front_matter = ?split.front_matter, "parsed block");

    let merged = merge_sources(attr_config, split.front_matter)?;
    let mut notices = Vec::new();
    let mut config = normalize_keys(merged, &mut notices)?;
    validate(&mut config)?;
    tracing::debug!(config = ?config, "resolved configuration");

    let config = BlockConfig::new(config);
    if config.data().is_some() && split.inline_data.is_some() {
        return Err(EmbedzError::DataSourceConflict);
    }

    Ok(ResolvedBlock {
        config,
        template: split.template,
        inline_data: split.inline_data,
        notices,
    })
}

fn names_fragment(attr_config: &Mapping) -> bool {
    KEY_ALIASES
        .iter()
        .filter(|alias| alias.canonical == "as")
        .any(|alias| attr_config.contains_key(alias.canonical) || attr_config.contains_key(alias.preferred))
}

/// A block that uses a saved fragment through its attributes and has no
/// front matter carries either YAML configuration (when `data` is an
/// attribute) or literal inline data.
fn apply_compat_layout(attr_config: &Mapping, split: &mut SplitText) {
    let text = split.template.trim().to_string();
    if attr_config.contains_key("data")
        && !text.is_empty()
        && let Ok(Some(config)) = front_matter::parse_mapping(&text)
    {
        split.front_matter = config;
        split.template.clear();
        split.inline_data = None;
        return;
    }
    split.template.clear();
    split.inline_data = if text.is_empty() { None } else { Some(text) };
}
