//! # Contract Normalization
//!
//! Passes that run after reference resolution and bring every operation into
//! the same shape:
//!
//! - Path-level `parameters` are copied into each verb (local declarations win).
//! - A missing or empty `security` list becomes `[{}]` (anonymous access).
//! - `tags` defaults to an empty list.
//! - Each operation records its route key under [`ROUTE_KEY`].
//!
//! Every pass is idempotent.

use crate::oas::models::Verb;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use tracing::warn;

/// Key under which each operation's `{pattern, verb}` is stored.
pub const ROUTE_KEY: &str = "x-route";

/// Runs every normalization pass on a resolved document.
pub fn normalize(document: &mut Value) {
    flatten_parameters(document);
    default_security(document);
    ensure_tags(document);
    inject_routes(document);
}

/// Copies shared path-level parameters into each operation.
///
/// The dedup key is `(in, name)`: a verb that already declares a parameter with
/// the same pair keeps its own declaration.
pub fn flatten_parameters(document: &mut Value) {
    let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };

    for (pattern, path_item) in paths.iter_mut() {
        let Some(item) = path_item.as_object_mut() else {
            continue;
        };
        let shared: Vec<Value> = item
            .get("parameters")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        for (key, operation) in item.iter_mut() {
            if Verb::from_key(key).is_none() {
                continue;
            }
            let Some(operation) = operation.as_object_mut() else {
                continue;
            };
            let declared = operation
                .entry("parameters")
                .or_insert_with(|| Value::Array(Vec::new()));
            if declared.is_null() {
                *declared = Value::Array(Vec::new());
            }
            let Some(local) = declared.as_array_mut() else {
                continue;
            };

            let mut seen = HashSet::new();
            for pair in local.iter().filter_map(parameter_key) {
                if !seen.insert(pair.clone()) {
                    warn!(
                        route = %pattern,
                        location = %pair.0,
                        name = %pair.1,
                        "parameter declared twice on the same operation"
                    );
                }
            }

            for parameter in &shared {
                let Some(pair) = parameter_key(parameter) else {
                    warn!(route = %pattern, "skipping shared parameter without 'in' and 'name'");
                    continue;
                };
                if seen.insert(pair) {
                    local.push(parameter.clone());
                }
            }
        }
    }
}

/// Ensures every operation has at least one security alternative.
pub fn default_security(document: &mut Value) {
    for_each_operation(document, |_, _, operation| {
        let security = operation
            .entry("security")
            .or_insert_with(|| Value::Array(Vec::new()));
        let missing = match security {
            Value::Null => true,
            Value::Array(list) => list.is_empty(),
            _ => false,
        };
        if missing {
            *security = json!([{}]);
        }
    });
}

/// Gives every operation a `tags` list.
pub fn ensure_tags(document: &mut Value) {
    for_each_operation(document, |_, _, operation| {
        let tags = operation
            .entry("tags")
            .or_insert_with(|| Value::Array(Vec::new()));
        if tags.is_null() {
            *tags = Value::Array(Vec::new());
        }
    });
}

/// Records each operation's route pattern and verb on the operation itself.
pub fn inject_routes(document: &mut Value) {
    for_each_operation(document, |pattern, verb, operation| {
        operation.insert(
            ROUTE_KEY.to_string(),
            json!({"pattern": pattern, "verb": verb.as_str()}),
        );
    });
}

/// Visits every operation object in document order.
pub(crate) fn for_each_operation<F>(document: &mut Value, mut visit: F)
where
    F: FnMut(&str, Verb, &mut Map<String, Value>),
{
    let Some(paths) = document.get_mut("paths").and_then(Value::as_object_mut) else {
        return;
    };
    for (pattern, path_item) in paths.iter_mut() {
        let Some(item) = path_item.as_object_mut() else {
            continue;
        };
        for (key, operation) in item.iter_mut() {
            let Some(verb) = Verb::from_key(key) else {
                continue;
            };
            if let Some(operation) = operation.as_object_mut() {
                visit(pattern, verb, operation);
            }
        }
    }
}

fn parameter_key(parameter: &Value) -> Option<(String, String)> {
    let location = parameter.get("in")?.as_str()?;
    let name = parameter.get("name")?.as_str()?;
    Some((location.to_string(), name.to_string()))
}
