//! The per-block pipeline

use embedz_config::{BlockConfig, ParseMode, ResolvedBlock, resolve, resolve_with};
use embedz_core::{EmbedzError, Mapping, Result, Value};
use embedz_loader::LoaderRegistry;
use embedz_templates::{
    JinjaEngine, TemplateEngine, VariableScope, build_context, has_template_syntax,
};
use std::io::Write;

use crate::block::{Block, Host, check_reparse};
use crate::data::{STDIN_SOURCE, describe_source, load_block_data};
use crate::diagnostics::{
    DiagnosticSink, FailureContext, FailureMode, bug_report, failure_report,
};
use crate::state::EmbedzState;

/// Settings for rendering a whole template outside a host document
#[derive(Debug, Clone, Default)]
pub struct StandaloneOverrides {
    /// Configuration applied beneath the template's own front matter
    pub config: Mapping,
    /// Read data from standard input when the configuration names no source
    pub stdin_fallback: bool,
}

/// Processes blocks in document order against one [`EmbedzState`]
pub struct Embedz {
    state: EmbedzState,
    registry: LoaderRegistry,
    failure_mode: FailureMode,
    diagnostics: DiagnosticSink,
}

impl Default for Embedz {
    fn default() -> Self {
        Self::new(EmbedzState::new())
    }
}

impl Embedz {
    /// Pipeline with the built-in loaders, reporting to stderr, failure mode
    /// taken from the environment
    pub fn new(state: EmbedzState) -> Self {
        Self {
            state,
            registry: LoaderRegistry::with_defaults(),
            failure_mode: FailureMode::from_env(),
            diagnostics: Box::new(std::io::stderr()),
        }
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    pub fn with_diagnostics(mut self, sink: DiagnosticSink) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn with_registry(mut self, registry: LoaderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn state(&self) -> &EmbedzState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut EmbedzState {
        &mut self.state
    }

    /// Process one block of a host document. `None` means the block only
    /// defined something and produces no output.
    #[tracing::instrument(skip(self, block), fields(attributes = block.attributes.len()))]
    pub fn process_block(&mut self, block: &Block) -> Result<Option<String>> {
        let mut failure = FailureContext::default();
        let outcome = resolve(&block.attributes, &block.text, ParseMode::Block)
            .and_then(|resolved| self.execute(resolved, &mut failure));
        self.settle(outcome, &failure)
    }

    /// Process a block and hand its output to the host for re-parsing
    pub fn process_into<H: Host>(&mut self, block: &Block, host: &mut H) -> Result<Vec<H::Node>> {
        let Some(text) = self.process_block(block)? else {
            return Ok(Vec::new());
        };
        let checked = host
            .reparse(&text)
            .and_then(|nodes| check_reparse(host, &text, &nodes).map(|()| nodes));
        self.settle(checked, &FailureContext::default())
    }

    /// Render a whole template file or text. Text after the front matter is
    /// all template; there is no inline data section.
    #[tracing::instrument(skip(self, text, overrides), fields(stdin_fallback = overrides.stdin_fallback))]
    pub fn render_standalone(&mut self, text: &str, overrides: &StandaloneOverrides) -> Result<String> {
        let mut failure = FailureContext::default();
        let outcome = resolve_with(overrides.config.clone(), text, ParseMode::Standalone)
            .and_then(|mut resolved| {
                if overrides.stdin_fallback
                    && resolved.config.data().is_none()
                    && !self.state.stdin_consumed()
                {
                    tracing::debug!("no data source configured, reading standard input");
                    resolved
                        .config
                        .set("data", Value::from(STDIN_SOURCE));
                }
                self.execute(resolved, &mut failure)
            })
            .map(Option::unwrap_or_default);
        self.settle(outcome, &failure)
    }

    fn execute(&mut self, resolved: ResolvedBlock, failure: &mut FailureContext) -> Result<Option<String>> {
        let ResolvedBlock {
            config,
            template,
            inline_data,
            notices,
        } = resolved;
        self.emit(&notices);
        record_context(failure, &config, inline_data.as_deref());

        let template = self.resolve_fragments(&config, template)?;

        if let Some(preamble) = config.preamble() {
            self.state.templates.add_preamble(preamble);
        }
        let with_vars = config.with_vars();
        let engine = JinjaEngine::new(&self.state.templates);

        let query = match config.query() {
            Some(query) if has_template_syntax(query) => {
                let context = build_context(&self.state.globals, &with_vars, None);
                let expanded = engine.render(query, &context)?;
                tracing::debug!(query = %expanded, "expanded query");
                Some(expanded)
            }
            other => other.map(str::to_string),
        };
        let options = config.load_options(query);

        let data = load_block_data(
            &self.registry,
            &mut self.state,
            &config,
            inline_data.as_deref(),
            &options,
        )?;

        let mut notices = Vec::new();
        let scope = VariableScope::new(&engine, &with_vars, data.as_ref());
        let applied = scope.apply(
            &mut self.state.globals,
            config.bind(),
            config.global(),
            config.alias(),
            &mut notices,
        );
        self.emit(&notices);
        applied?;

        let has_data = data.as_ref().is_some_and(Value::is_truthy);
        let definition_only = config.fragment_name().is_some() || template.trim().is_empty();
        if !has_data && definition_only {
            tracing::debug!("definition-only block, no output");
            return Ok(None);
        }

        let context = build_context(&self.state.globals, &with_vars, data.as_ref());
        engine.render_block(&template, &context).map(Some)
    }

    /// Save this block's template under `name` and swap in the fragment named
    /// by `as`
    fn resolve_fragments(&mut self, config: &BlockConfig, template: String) -> Result<String> {
        if let Some(name) = config.fragment_name() {
            if self.state.templates.save_fragment(name, &template) {
                tracing::warn!(fragment = %name, "overwriting saved template");
                self.emit(&[format!("Warning: Overwriting template '{}'", name)]);
            }
            tracing::debug!(fragment = %name, "saved template");
        }

        match config.fragment_ref() {
            Some(reference) => self
                .state
                .templates
                .fragment(reference)
                .map(str::to_string)
                .ok_or_else(|| EmbedzError::TemplateNotFound(reference.to_string())),
            None => Ok(template),
        }
    }

    fn emit(&mut self, notices: &[String]) {
        for notice in notices {
            if let Err(err) = writeln!(self.diagnostics, "{}", notice) {
                tracing::warn!(error = %err, "failed to write notice");
            }
        }
    }

    fn write_diagnostic(&mut self, text: &str) {
        let written = self
            .diagnostics
            .write_all(text.as_bytes())
            .and_then(|()| self.diagnostics.flush());
        if let Err(err) = written {
            tracing::warn!(error = %err, "failed to write diagnostic");
        }
    }

    /// Report a failure and decide what happens next
    fn settle<T>(&mut self, outcome: Result<T>, failure: &FailureContext) -> Result<T> {
        let error = match outcome {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.is_recognized() {
            tracing::error!(error = %error, category = ?error.category(), "unexpected failure");
            self.write_diagnostic(&bug_report(&error));
            return Err(error);
        }

        tracing::error!(error = %error, category = ?error.category(), "block failed");
        self.write_diagnostic(&failure_report(&error, failure));
        match self.failure_mode {
            FailureMode::Propagate => Err(error),
            FailureMode::Exit => std::process::exit(1),
        }
    }
}

fn record_context(failure: &mut FailureContext, config: &BlockConfig, inline_data: Option<&str>) {
    failure.config = Some(config.as_mapping().clone());
    failure.data_source = describe_source(config);
    failure.format = config
        .format()
        .map(|format| format.name().to_string())
        .or_else(|| config.format_name().map(str::to_string));
    failure.header = Some(config.header());
    failure.template_name = config
        .fragment_ref()
        .or_else(|| config.fragment_name())
        .map(str::to_string);
    failure.inline_data = inline_data.map(str::to_string);
}

