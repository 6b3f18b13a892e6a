//! # Reference Resolution
//!
//! Expands every local `$ref` in a raw contract document in place, so later
//! passes never see a reference object.
//!
//! A node carrying `$ref` is replaced by a copy of its target, and that copy is
//! resolved in turn. Chains of references are therefore followed to the end;
//! a pointer that is re-entered while it is still being expanded is a cycle.
//! Each pointer is expanded once; later uses copy the finished expansion.

use crate::error::{AppError, AppResult};
use crate::oas::pointer::{parse_local_ref, walk_pointer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

const REF_KEY: &str = "$ref";

/// Resolves all local references in `document`, mutating it in place.
///
/// Lookups always go against the document as it was before resolution started.
pub fn resolve_references(document: &mut Value) -> AppResult<()> {
    let root = document.clone();
    let mut resolver = Resolver::new(&root);
    resolver.resolve(document)?;
    debug!(
        substitutions = resolver.substitutions,
        targets = resolver.resolved.len(),
        "resolved local references"
    );
    Ok(())
}

/// Returns true if any `$ref` key remains anywhere in `node`.
pub fn contains_references(node: &Value) -> bool {
    match node {
        Value::Object(map) => map.contains_key(REF_KEY) || map.values().any(contains_references),
        Value::Array(items) => items.iter().any(contains_references),
        _ => false,
    }
}

struct Resolver<'a> {
    root: &'a Value,
    /// References currently being expanded, outermost first.
    active: Vec<String>,
    /// Fully expanded targets by reference string.
    resolved: HashMap<String, Value>,
    substitutions: usize,
}

impl<'a> Resolver<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            active: Vec::new(),
            resolved: HashMap::new(),
            substitutions: 0,
        }
    }

    fn resolve(&mut self, node: &mut Value) -> AppResult<()> {
        let reference = node
            .as_object()
            .and_then(|map| map.get(REF_KEY))
            .cloned();

        if let Some(reference) = reference {
            *node = self.expand(&reference)?;
            return Ok(());
        }

        match node {
            Value::Object(map) => {
                for value in map.values_mut() {
                    self.resolve(value)?;
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.resolve(item)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn expand(&mut self, reference: &Value) -> AppResult<Value> {
        let Some(ref_str) = reference.as_str() else {
            return Err(AppError::UnsupportedReference(reference.to_string()));
        };
        let segments = parse_local_ref(ref_str)?;

        if self.active.iter().any(|r| r == ref_str) {
            return Err(AppError::CyclicReference(ref_str.to_string()));
        }
        if let Some(done) = self.resolved.get(ref_str) {
            self.substitutions += 1;
            return Ok(done.clone());
        }

        let mut target = walk_pointer(self.root, &segments)
            .cloned()
            .ok_or_else(|| AppError::BrokenReference(ref_str.to_string()))?;

        self.active.push(ref_str.to_string());
        let result = self.resolve(&mut target);
        self.active.pop();
        result?;

        self.substitutions += 1;
        self.resolved.insert(ref_str.to_string(), target.clone());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc_from_yaml(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_resolves_parameter_refs() {
        let mut doc = doc_from_yaml(
            r#"
paths:
  /items:
    get:
      parameters:
        - $ref: '#/components/parameters/Limit'
components:
  parameters:
    Limit:
      name: limit
      in: query
      schema: {type: integer}
"#,
        );
        resolve_references(&mut doc).unwrap();
        assert_eq!(
            doc["paths"]["/items"]["get"]["parameters"][0],
            json!({"name": "limit", "in": "query", "schema": {"type": "integer"}})
        );
        assert!(!contains_references(&doc));
    }

    #[test]
    fn test_follows_reference_chains() {
        let mut doc = json!({
            "a": {"$ref": "#/b"},
            "b": {"$ref": "#/c"},
            "c": {"value": 1}
        });
        resolve_references(&mut doc).unwrap();
        assert_eq!(doc["a"], json!({"value": 1}));
        assert_eq!(doc["b"], json!({"value": 1}));
    }

    #[test]
    fn test_nested_refs_inside_target() {
        let mut doc = json!({
            "use": {"$ref": "#/defs/Outer"},
            "defs": {
                "Outer": {"inner": [{"$ref": "#/defs/Inner"}]},
                "Inner": {"type": "string"}
            }
        });
        resolve_references(&mut doc).unwrap();
        assert_eq!(doc["use"], json!({"inner": [{"type": "string"}]}));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut doc = json!({
            "x": [{"$ref": "#/y"}, 3],
            "y": {"k": "v"}
        });
        resolve_references(&mut doc).unwrap();
        let once = doc.clone();
        resolve_references(&mut doc).unwrap();
        assert_eq!(doc, once);
    }

    #[test]
    fn test_non_local_ref_fails() {
        let mut doc = json!({"x": {"$ref": "other.yaml#/y"}});
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedReference(r) if r == "other.yaml#/y"));
    }

    #[test]
    fn test_broken_ref_fails() {
        let mut doc = json!({"x": {"$ref": "#/nope/missing"}});
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::BrokenReference(r) if r == "#/nope/missing"));
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut doc = json!({
            "a": {"$ref": "#/b"},
            "b": {"next": {"$ref": "#/a"}}
        });
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::CyclicReference(_)));
    }

    #[test]
    fn test_self_reference_is_detected() {
        let mut doc = json!({"node": {"child": {"$ref": "#/node"}}});
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::CyclicReference(r) if r == "#/node"));
    }

    #[test]
    fn test_same_target_used_twice_is_not_a_cycle() {
        let mut doc = json!({
            "pair": [{"$ref": "#/t"}, {"$ref": "#/t"}],
            "t": {"ok": true}
        });
        resolve_references(&mut doc).unwrap();
        assert_eq!(doc["pair"], json!([{"ok": true}, {"ok": true}]));
    }

    #[test]
    fn test_shared_targets_are_expanded_once() {
        // Each level points at the one below twice.
        let depth = 12;
        let mut defs = serde_json::Map::new();
        defs.insert("L0".to_string(), json!({"type": "string"}));
        for level in 1..=depth {
            let below = format!("#/defs/L{}", level - 1);
            defs.insert(
                format!("L{}", level),
                json!({"left": {"$ref": below}, "right": {"$ref": below}}),
            );
        }
        let mut doc = json!({
            "use": {"$ref": format!("#/defs/L{}", depth)},
            "defs": defs
        });

        let root = doc.clone();
        let mut resolver = Resolver::new(&root);
        resolver.resolve(&mut doc).unwrap();

        assert_eq!(resolver.resolved.len(), depth + 1);
        assert!(!contains_references(&doc));
        let mut node = &doc["use"];
        for _ in 0..depth {
            assert_eq!(node["left"], node["right"]);
            node = &node["right"];
        }
        assert_eq!(node, &json!({"type": "string"}));
    }

    #[test]
    fn test_cycle_behind_shared_target_is_detected() {
        let mut doc = json!({
            "first": {"$ref": "#/shared"},
            "shared": {"leaf": 1},
            "loop": {"again": {"$ref": "#/loop"}, "other": {"$ref": "#/shared"}}
        });
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::CyclicReference(r) if r == "#/loop"));
    }

    #[test]
    fn test_non_string_ref_is_unsupported() {
        let mut doc = json!({"x": {"$ref": 5}});
        let err = resolve_references(&mut doc).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedReference(_)));
    }
}
