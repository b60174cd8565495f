//! Template engine using MiniJinja

use embedz_core::{EmbedzError, Mapping, Result, Value};
use indexmap::IndexMap;
use minijinja::Environment;
use std::sync::Arc;

use crate::convert::from_engine;
use crate::store::TemplateStore;

const PREAMBLE_MARKER: &str = "\u{1}";

/// Renders template text and evaluates expressions against a context.
pub trait TemplateEngine {
    /// Render `source` to text
    fn render(&self, source: &str, context: &Mapping) -> Result<String>;

    /// Evaluate a single expression, keeping the native type of the result
    fn evaluate(&self, expression: &str, context: &Mapping) -> Result<Value>;
}

/// MiniJinja-backed engine bound to a snapshot of the saved fragments and
/// preamble.
///
/// Build a new engine after the store changes; fragments saved later are not
/// visible to an existing one.
pub struct JinjaEngine {
    env: Environment<'static>,
    preamble: String,
}

impl JinjaEngine {
    pub fn new(store: &TemplateStore) -> Self {
        let fragments: Arc<IndexMap<String, String>> = Arc::new(store.fragments().clone());

        let mut env = Environment::new();
        env.set_loader(move |name| Ok(fragments.get(name).cloned()));
        crate::functions::register_helpers(&mut env);

        Self {
            env,
            preamble: store.preamble().to_string(),
        }
    }

    /// Render a block body, preserving its trailing newlines (at least one).
    pub fn render_block(&self, body: &str, context: &Mapping) -> Result<String> {
        let (content, newlines) = split_trailing_newlines(body);
        let mut rendered = self.render(content, context)?;
        rendered.push_str(&newlines);
        Ok(rendered)
    }
}

impl TemplateEngine for JinjaEngine {
    #[tracing::instrument(skip(self, source, context), fields(source_len = source.len()))]
    fn render(&self, source: &str, context: &Mapping) -> Result<String> {
        if self.preamble.is_empty() {
            return self.env.render_str(source, context).map_err(template_error);
        }

        // Whatever the preamble prints lands before the marker and is dropped.
        let full = format!("{}{}{}", self.preamble, PREAMBLE_MARKER, source);
        let rendered = self.env.render_str(&full, context).map_err(template_error)?;
        let body = match rendered.split_once(PREAMBLE_MARKER) {
            Some((_, rest)) => rest,
            None => rendered.strip_prefix('\n').unwrap_or(&rendered),
        };
        Ok(body.to_string())
    }

    fn evaluate(&self, expression: &str, context: &Mapping) -> Result<Value> {
        let compiled = self
            .env
            .compile_expression(expression)
            .map_err(template_error)?;
        let result = compiled.eval(context).map_err(template_error)?;
        Ok(from_engine(&result))
    }
}

fn template_error(err: minijinja::Error) -> EmbedzError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(&format!(": {}", cause));
        source = cause.source();
    }
    EmbedzError::Template(message)
}

/// Check if text contains template syntax
pub fn has_template_syntax(text: &str) -> bool {
    text.contains("{{") || text.contains("{%")
}

/// Split a body into its content and its trailing newlines. A body without
/// trailing newlines gets a single one.
pub fn split_trailing_newlines(body: &str) -> (&str, String) {
    let content = body.trim_end_matches('\n');
    let count = (body.len() - content.len()).max(1);
    (content, "\n".repeat(count))
}
