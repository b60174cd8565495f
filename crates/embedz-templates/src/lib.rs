//! Template rendering and variable expansion for embedz
//!
//! MiniJinja provides template and expression evaluation. This crate layers
//! on top of it:
//!
//! - **Fragments and preamble**: [`TemplateStore`] keeps named template
//!   bodies (reachable through `include`/`import`) and the macro preamble
//!   prepended to every render
//! - **Helpers**: `to_dict`, `raise`, `regex_search`, `regex_replace`,
//!   `regex_findall` and a type-preserving `sum`
//! - **Variables**: string-template expansion for `global:`, typed
//!   evaluation for `bind:`, dotted-path assignment and `alias:` copies
//!
//! ## Example
//!
//! ```rust,ignore
//! use embedz_templates::{JinjaEngine, TemplateEngine, TemplateStore, build_context};
//!
//! let store = TemplateStore::new();
//! let engine = JinjaEngine::new(&store);
//! let context = build_context(&globals, &with_vars, Some(&data));
//! let text = engine.render_block("{% for row in data %}{{ row.name }}{% endfor %}", &context)?;
//! ```

mod context;
mod convert;
mod engine;
mod functions;
mod pattern;
mod store;
mod variables;

pub use context::build_context;
pub use convert::{from_engine, to_engine};
pub use engine::{JinjaEngine, TemplateEngine, has_template_syntax, split_trailing_newlines};
pub use functions::register_helpers;
pub use store::TemplateStore;
pub use variables::{
    BindingKind, VariableScope, apply_aliases, apply_section, evaluate_bind_value, expand_value,
};
