use embedz_core::{Mapping, Value};

/// Build the variables a template sees.
///
/// Globals and then locals are flattened into the top level, so a local
/// shadows a global of the same name. Both are also reachable as `global.x`
/// and `with.x`. `data` is present only when data was loaded.
pub fn build_context(globals: &Mapping, with_vars: &Mapping, data: Option<&Value>) -> Mapping {
    let mut context = Mapping::with_capacity(globals.len() + with_vars.len() + 3);
    for (key, value) in globals.iter().chain(with_vars) {
        context.insert(key.clone(), value.clone());
    }
    context.insert("global".to_string(), Value::Map(globals.clone()));
    context.insert("with".to_string(), Value::Map(with_vars.clone()));
    if let Some(data) = data {
        context.insert("data".to_string(), data.clone());
    }
    context
}
