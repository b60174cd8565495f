//! Helper functions and filters available in every template and expression
//!
//! - `to_dict(data, key, strict=true, transpose=false)` groups records by a field
//! - `raise(message)` aborts rendering with a user-facing message
//! - `regex_search`, `regex_replace`, `regex_findall`
//! - `sum(values, attribute=none, start=0)` keeping integer totals integral

use indexmap::IndexMap;
use minijinja::value::{Enumerator, Object, ObjectRepr};
use minijinja::{Environment, Error, ErrorKind, Value};
use std::sync::Arc;

use crate::pattern::{Pattern, PatternFlags, translate_replacement};

/// Register the helpers on an environment. `to_dict` is available both as a
/// filter and as a function.
pub fn register_helpers(env: &mut Environment) {
    env.add_filter("to_dict", to_dict);
    env.add_function("to_dict", to_dict);
    env.add_function("raise", raise);
    env.add_filter("regex_search", regex_search);
    env.add_filter("regex_replace", regex_replace);
    env.add_filter("regex_findall", regex_findall);
    env.add_filter("sum", sum);
}

fn invalid(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidOperation, message.into())
}

/// Positional arguments plus an optional trailing keyword map
struct CallArgs<'a> {
    positional: &'a [Value],
    kwargs: Option<&'a Value>,
}

impl<'a> CallArgs<'a> {
    fn new(args: &'a [Value]) -> Self {
        match args.split_last() {
            Some((last, rest)) if last.is_kwargs() => Self {
                positional: rest,
                kwargs: Some(last),
            },
            _ => Self {
                positional: args,
                kwargs: None,
            },
        }
    }

    /// Argument by keyword, else by position. Undefined and none count as
    /// absent.
    fn get(&self, name: &str, index: usize) -> Option<Value> {
        let keyword = self
            .kwargs
            .and_then(|kw| kw.get_item(&Value::from(name)).ok())
            .filter(|v| !v.is_undefined());
        keyword
            .or_else(|| self.positional.get(index).cloned())
            .filter(|v| !v.is_undefined() && !v.is_none())
    }

    fn required(&self, function: &str, name: &str, index: usize) -> Result<Value, Error> {
        self.get(name, index)
            .ok_or_else(|| invalid(format!("{}() missing required argument '{}'", function, name)))
    }

    fn string(&self, function: &str, name: &str, index: usize) -> Result<String, Error> {
        let value = self.required(function, name, index)?;
        match value.as_str() {
            Some(s) => Ok(s.to_string()),
            None => Err(invalid(format!(
                "{}() argument '{}' must be a string",
                function, name
            ))),
        }
    }

    fn flag(&self, name: &str, index: usize, default: bool) -> bool {
        self.get(name, index).map_or(default, |v| v.is_true())
    }
}

/// Records keyed by one of their fields. Keys keep their native type, so
/// `by_id[3]` works for integer ids.
#[derive(Debug)]
struct KeyedRecords {
    entries: IndexMap<Value, Value>,
}

impl Object for KeyedRecords {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Map
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn enumerate(self: &Arc<Self>) -> Enumerator {
        Enumerator::Values(self.entries.keys().cloned().collect())
    }
}

fn to_dict(args: &[Value]) -> Result<Value, Error> {
    let args = CallArgs::new(args);
    let data = args.required("to_dict", "data", 0)?;
    let key = args.string("to_dict", "key", 1)?;
    let strict = args.flag("strict", 2, true);
    let transpose = args.flag("transpose", 3, false);
    let key_value = Value::from(key.as_str());

    let mut entries: IndexMap<Value, Value> = IndexMap::new();
    let mut columns: IndexMap<Value, IndexMap<Value, Value>> = IndexMap::new();

    for record in data
        .try_iter()
        .map_err(|_| invalid("to_dict() expects a list of records"))?
    {
        let id = record.get_item(&key_value).unwrap_or_default();
        if id.is_undefined() {
            return Err(invalid(format!("to_dict(): record has no key '{}'", key)));
        }
        if strict && entries.contains_key(&id) {
            return Err(invalid(format!(
                "to_dict(): duplicate key '{}' (pass strict=false to keep the last record)",
                id
            )));
        }

        if transpose {
            for column in record.try_iter()? {
                if column == key_value {
                    continue;
                }
                let cell = record.get_item(&column).unwrap_or_default();
                columns
                    .entry(column)
                    .or_default()
                    .insert(id.clone(), cell);
            }
        }
        entries.insert(id, record);
    }

    for (column, cells) in columns {
        if entries.contains_key(&column) {
            tracing::debug!(column = %column, "to_dict transpose: column name shadowed by record key");
            continue;
        }
        let by_record = Value::from_object(KeyedRecords { entries: cells });
        entries.insert(column, by_record);
    }

    Ok(Value::from_object(KeyedRecords { entries }))
}

fn raise(message: String) -> Result<Value, Error> {
    Err(invalid(message))
}

fn flags(args: &CallArgs<'_>, first: usize) -> PatternFlags {
    PatternFlags {
        ignorecase: args.flag("ignorecase", first, false),
        multiline: args.flag("multiline", first + 1, false),
    }
}

fn compile(pattern: &str, flags: PatternFlags) -> Result<Pattern, Error> {
    Pattern::compile(pattern, flags).map_err(invalid)
}

fn subject(value: &Value) -> String {
    match value.as_str() {
        Some(s) => s.to_string(),
        None if value.is_none() || value.is_undefined() => String::new(),
        None => value.to_string(),
    }
}

/// First match of `pattern` in the value, or none
fn regex_search(args: &[Value]) -> Result<Value, Error> {
    let args = CallArgs::new(args);
    let text = subject(&args.get("value", 0).unwrap_or_default());
    let pattern = compile(&args.string("regex_search", "pattern", 1)?, flags(&args, 2))?;
    let found = pattern.search(&text).map_err(invalid)?;
    Ok(found.map(Value::from).unwrap_or(Value::from(())))
}

fn regex_replace(args: &[Value]) -> Result<Value, Error> {
    let args = CallArgs::new(args);
    let text = subject(&args.get("value", 0).unwrap_or_default());
    let pattern = compile(&args.string("regex_replace", "pattern", 1)?, flags(&args, 3))?;
    let replacement = match args.get("replacement", 2) {
        Some(value) => subject(&value),
        None => String::new(),
    };
    let count = match args.get("count", 5) {
        Some(value) => usize::try_from(value)
            .map_err(|_| invalid("regex_replace() 'count' must be a non-negative integer"))?,
        None => 0,
    };
    let replaced = pattern
        .replace(&text, &translate_replacement(&replacement), count)
        .map_err(invalid)?;
    Ok(Value::from(replaced))
}

/// Every match; a list of strings, or a list of group lists when the
/// pattern has more than one group
fn regex_findall(args: &[Value]) -> Result<Value, Error> {
    let args = CallArgs::new(args);
    let text = subject(&args.get("value", 0).unwrap_or_default());
    let pattern = compile(&args.string("regex_findall", "pattern", 1)?, flags(&args, 2))?;
    let found = pattern.find_all(&text).map_err(invalid)?;
    let items: Vec<Value> = found
        .into_iter()
        .map(|mut groups| {
            if groups.len() == 1 {
                Value::from(groups.remove(0))
            } else {
                Value::from(groups)
            }
        })
        .collect();
    Ok(Value::from(items))
}

fn attribute_path(item: &Value, path: &str) -> Value {
    let mut current = item.clone();
    for segment in path.split('.') {
        let next = match segment.parse::<i64>() {
            Ok(index) => current.get_item(&Value::from(index)),
            Err(_) => current.get_attr(segment),
        };
        current = next.unwrap_or_default();
        if current.is_undefined() {
            break;
        }
    }
    current
}

/// Sum a sequence, optionally of a (dotted) attribute of each item. None
/// values are skipped.
fn sum(args: &[Value]) -> Result<Value, Error> {
    let args = CallArgs::new(args);
    let values = args.get("value", 0).unwrap_or_default();
    let attribute = match args.get("attribute", 1) {
        Some(value) => Some(subject(&value)),
        None => None,
    };
    let start = args.get("start", 2).unwrap_or(Value::from(0));

    let mut int_total: Option<i64> = i64::try_from(start.clone()).ok().filter(|_| start.is_integer());
    let mut float_total = f64::try_from(start.clone())
        .map_err(|_| invalid("sum() 'start' must be a number"))?;

    if values.is_undefined() || values.is_none() {
        return Ok(start);
    }
    for item in values.try_iter()? {
        let value = match &attribute {
            Some(path) => attribute_path(&item, path),
            None => item,
        };
        if value.is_undefined() || value.is_none() {
            continue;
        }
        let number = f64::try_from(value.clone()).map_err(|_| {
            invalid(format!("sum() cannot add value of type {}", value.kind()))
        })?;
        float_total += number;
        int_total = match (int_total, value.is_integer()) {
            (Some(total), true) => i64::try_from(value).ok().and_then(|v| total.checked_add(v)),
            _ => None,
        };
    }

    Ok(match int_total {
        Some(total) => Value::from(total),
        None => Value::from(float_total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::to_engine;
    use minijinja::context;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn env() -> Environment<'static> {
        let mut env = Environment::new();
        register_helpers(&mut env);
        env
    }

    fn render(template: &str, ctx: Value) -> String {
        env().render_str(template, ctx).unwrap()
    }

    fn engine_value(json: serde_json::Value) -> Value {
        to_engine(&embedz_core::Value::from(json))
    }

    fn records() -> Value {
        engine_value(serde_json::json!([
            {"id": 1, "name": "Alice", "score": 90},
            {"id": 2, "name": "Bob", "score": 75},
        ]))
    }

    #[test]
    fn test_to_dict_native_keys() {
        let out = render(
            "{% set by_id = data | to_dict('id') %}{{ by_id[2].name }}",
            context! { data => records() },
        );
        assert_eq!(out, "Bob");
    }

    #[test]
    fn test_to_dict_as_function_keeps_order() {
        let out = render(
            "{% for k, v in to_dict(data, key='name') | items %}{{ k }}={{ v.score }};{% endfor %}",
            context! { data => records() },
        );
        assert_eq!(out, "Alice=90;Bob=75;");
    }

    #[test]
    fn test_to_dict_strict_rejects_duplicates() {
        let data = engine_value(serde_json::json!([{"k": "a"}, {"k": "a"}]));
        let err = env()
            .render_str("{{ data | to_dict('k') }}", context! { data => data })
            .unwrap_err();
        assert!(err.to_string().contains("duplicate key 'a'"));
    }

    #[test]
    fn test_to_dict_lenient_last_wins() {
        let data = engine_value(serde_json::json!([
            {"k": "a", "v": 1},
            {"k": "a", "v": 2},
        ]));
        let out = render(
            "{{ (data | to_dict('k', strict=false))['a'].v }}",
            context! { data => data },
        );
        assert_eq!(out, "2");
    }

    #[test]
    fn test_to_dict_transpose() {
        let out = render(
            "{% set t = data | to_dict('id', transpose=true) %}{{ t.score[1] }}/{{ t[2].name }}",
            context! { data => records() },
        );
        assert_eq!(out, "90/Bob");
    }

    #[test]
    fn test_raise() {
        let err = env()
            .render_str("{{ raise('threshold missing') }}", context! {})
            .unwrap_err();
        assert!(err.to_string().contains("threshold missing"));
    }

    #[rstest]
    #[case("{{ 'Order 123-456' | regex_search('\\\\d+') }}", "123")]
    #[case("{{ 'ABC' | regex_search('b', ignorecase=true) }}", "B")]
    #[case("{{ 'abc' | regex_search('z') is none }}", "true")]
    #[case("{{ '2024-01-02' | regex_replace('(\\\\d+)-(\\\\d+)-(\\\\d+)', '\\\\3/\\\\2/\\\\1') }}", "02/01/2024")]
    #[case("{{ 'aaa' | regex_replace('a', 'b', count=1) }}", "baa")]
    #[case("{{ 'a1b22' | regex_findall('\\\\d+') | join(',') }}", "1,22")]
    #[case("{{ 'x\\nfoo\\nbar' | regex_findall('^\\\\w+$', multiline=true) | length }}", "3")]
    fn test_regex_helpers(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(render(template, context! {}), expected);
    }

    #[rstest]
    #[case("{{ [1, 2, 3] | sum }}", "6")]
    #[case("{{ [1, 2.5] | sum }}", "3.5")]
    #[case("{{ [1, none, 2] | sum }}", "3")]
    #[case("{{ [1, 2] | sum(start=10) }}", "13")]
    #[case("{{ data | sum(attribute='score') }}", "165")]
    fn test_sum(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(render(template, context! { data => records() }), expected);
    }

    #[test]
    fn test_sum_dotted_attribute() {
        let data = engine_value(serde_json::json!([
            {"stats": {"n": 2}},
            {"stats": {"n": 5}},
        ]));
        assert_eq!(
            render("{{ data | sum(attribute='stats.n') }}", context! { data => data }),
            "7"
        );
    }
}
