//! `global:`, `bind:` and `alias:` processing against the global store

use embedz_core::{Mapping, Result, Value, assign_path};

use crate::context::build_context;
use crate::engine::{TemplateEngine, has_template_syntax};

/// How the values of a section are turned into stored values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Strings with template syntax are rendered; the result is a string
    Expand,
    /// Strings are expressions; the result keeps its native type
    Bind,
}

/// Render every templated string inside `value`.
///
/// Strings without template syntax and non-string scalars are returned
/// unchanged.
pub fn expand_value<E: TemplateEngine + ?Sized>(
    engine: &E,
    value: &Value,
    context: &Mapping,
) -> Result<Value> {
    match value {
        Value::String(text) if has_template_syntax(text) => {
            let rendered = engine.render(text, context)?;
            let rendered = rendered.strip_prefix('\n').unwrap_or(&rendered);
            Ok(Value::String(rendered.to_string()))
        }
        Value::List(items) => items
            .iter()
            .map(|item| expand_value(engine, item, context))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Value::Map(map) => {
            let mut expanded = Mapping::with_capacity(map.len());
            for (key, item) in map {
                expanded.insert(key.clone(), expand_value(engine, item, context)?);
            }
            Ok(Value::Map(expanded))
        }
        other => Ok(other.clone()),
    }
}

/// Evaluate a bind value. Strings are expressions, containers recurse and
/// other scalars are kept verbatim.
pub fn evaluate_bind_value<E: TemplateEngine + ?Sized>(
    engine: &E,
    value: &Value,
    context: &Mapping,
) -> Result<Value> {
    match value {
        Value::String(expression) => engine.evaluate(expression, context),
        Value::List(items) => items
            .iter()
            .map(|item| evaluate_bind_value(engine, item, context))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        Value::Map(map) => {
            let mut evaluated = Mapping::with_capacity(map.len());
            for (key, item) in map {
                evaluated.insert(key.clone(), evaluate_bind_value(engine, item, context)?);
            }
            Ok(Value::Map(evaluated))
        }
        other => Ok(other.clone()),
    }
}

/// Apply one section to the global store, key by key in document order.
///
/// The context is rebuilt for every key, so a value assigned earlier in the
/// section is visible to the keys after it. Dotted keys assign into nested
/// mappings.
pub fn apply_section<E: TemplateEngine + ?Sized>(
    store: &mut Mapping,
    section: &Mapping,
    with_vars: &Mapping,
    data: Option<&Value>,
    engine: &E,
    kind: BindingKind,
    notices: &mut Vec<String>,
) -> Result<()> {
    for (key, raw) in section {
        let context = build_context(store, with_vars, data);
        let value = match kind {
            BindingKind::Expand => expand_value(engine, raw, &context)?,
            BindingKind::Bind => evaluate_bind_value(engine, raw, &context)?,
        };

        if kind == BindingKind::Bind && value.is_null() {
            tracing::warn!(variable = %key, expression = %raw, "bind expression evaluated to none");
            notices.push(format!(
                "Warning: bind '{}' evaluated to none (expression: {})",
                key, raw
            ));
        }

        tracing::debug!(variable = %key, kind = ?kind, value_type = value.type_name(), "global variable set");
        assign_path(store, key, value)?;
    }
    Ok(())
}

/// Copy `source` values to `alias` keys in every mapping reachable from the
/// store, including mappings inside lists. Existing alias keys are kept.
pub fn apply_aliases(store: &mut Mapping, aliases: &Mapping) {
    for value in store.values_mut() {
        alias_nested(value, aliases);
    }
    add_aliases(store, aliases);
}

fn alias_nested(value: &mut Value, aliases: &Mapping) {
    match value {
        Value::Map(map) => apply_aliases(map, aliases),
        Value::List(items) => {
            for item in items {
                alias_nested(item, aliases);
            }
        }
        _ => {}
    }
}

fn add_aliases(map: &mut Mapping, aliases: &Mapping) {
    for (alias, source) in aliases {
        let Some(source) = source.as_str() else {
            continue;
        };
        if map.contains_key(alias) {
            continue;
        }
        if let Some(value) = map.get(source).cloned() {
            map.insert(alias.clone(), value);
        }
    }
}

/// The variable sections of one block, applied in their fixed order:
/// top-level `bind:`, then `global.bind`, then the remaining `global:` keys,
/// then `alias:`.
pub struct VariableScope<'a, E: TemplateEngine + ?Sized> {
    engine: &'a E,
    with_vars: &'a Mapping,
    data: Option<&'a Value>,
}

impl<'a, E: TemplateEngine + ?Sized> VariableScope<'a, E> {
    pub fn new(engine: &'a E, with_vars: &'a Mapping, data: Option<&'a Value>) -> Self {
        Self {
            engine,
            with_vars,
            data,
        }
    }

    pub fn apply(
        &self,
        store: &mut Mapping,
        bind: Option<&Mapping>,
        global: Option<&Mapping>,
        alias: Option<&Mapping>,
        notices: &mut Vec<String>,
    ) -> Result<()> {
        if let Some(bind) = bind {
            self.section(store, bind, BindingKind::Bind, notices)?;
        }

        if let Some(global) = global {
            let nested_bind = global.get("bind").and_then(Value::as_map);
            if let Some(nested_bind) = nested_bind {
                self.section(store, nested_bind, BindingKind::Bind, notices)?;
            }
            let rest: Mapping = global
                .iter()
                .filter(|(key, _)| !(nested_bind.is_some() && key.as_str() == "bind"))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            self.section(store, &rest, BindingKind::Expand, notices)?;
        }

        if let Some(alias) = alias {
            apply_aliases(store, alias);
        }
        Ok(())
    }

    fn section(
        &self,
        store: &mut Mapping,
        section: &Mapping,
        kind: BindingKind,
        notices: &mut Vec<String>,
    ) -> Result<()> {
        apply_section(
            store,
            section,
            self.with_vars,
            self.data,
            self.engine,
            kind,
            notices,
        )
    }
}
