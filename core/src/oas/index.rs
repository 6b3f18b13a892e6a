//! # Operation Index
//!
//! Lookup structures over every operation of a normalized contract: by
//! `operationId`, by `(route pattern, verb)`, by tag and by route pattern.

use crate::error::{AppError, AppResult};
use crate::oas::models::{Operation, Verb};
use crate::oas::normalization::ROUTE_KEY;
use crate::oas::shims::ShimOperation;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Every operation of a contract, in document order.
#[derive(Debug, Clone, Default)]
pub struct OperationIndex {
    operations: IndexMap<String, Operation>,
    routes: HashMap<(String, Verb), String>,
    tags: IndexSet<String>,
}

impl OperationIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from a resolved and normalized document.
    pub fn build(document: &Value) -> AppResult<Self> {
        let mut index = Self::new();
        let Some(paths) = document.get("paths").and_then(Value::as_object) else {
            return Ok(index);
        };

        for (pattern, path_item) in paths {
            let Some(item) = path_item.as_object() else {
                continue;
            };
            for (key, raw) in item {
                let Some(verb) = Verb::from_key(key) else {
                    continue;
                };
                if raw.get(ROUTE_KEY).is_none() {
                    return Err(AppError::Internal(format!(
                        "operation {} {} was not normalized",
                        verb, pattern
                    )));
                }
                let operation = ShimOperation::from_value(raw, pattern, verb)?.into_operation()?;
                index.insert(operation)?;
            }
        }

        debug!(
            operations = index.len(),
            tags = index.tags.len(),
            "indexed operations"
        );
        Ok(index)
    }

    /// Adds an operation, enforcing id and route uniqueness.
    pub fn insert(&mut self, operation: Operation) -> AppResult<()> {
        if self.operations.contains_key(&operation.id) {
            return Err(AppError::DuplicateOperationId(operation.id));
        }
        let route = (operation.route_pattern.clone(), operation.verb);
        if self.routes.contains_key(&route) {
            return Err(AppError::DuplicateRoute {
                pattern: route.0,
                verb: route.1.as_str().to_string(),
            });
        }

        self.tags.extend(operation.tags.iter().cloned());
        self.routes.insert(route, operation.id.clone());
        self.operations.insert(operation.id.clone(), operation);
        Ok(())
    }

    /// Looks up an operation by `operationId`.
    pub fn by_id(&self, id: &str) -> AppResult<&Operation> {
        self.operations
            .get(id)
            .ok_or_else(|| AppError::OperationNotFound(id.to_string()))
    }

    /// Looks up an operation by route pattern and verb.
    pub fn by_route(&self, pattern: &str, verb: Verb) -> AppResult<&Operation> {
        self.routes
            .get(&(pattern.to_string(), verb))
            .and_then(|id| self.operations.get(id))
            .ok_or_else(|| {
                AppError::OperationNotFound(format!(
                    "{} {}",
                    verb.as_str().to_uppercase(),
                    pattern
                ))
            })
    }

    /// Looks up the operation for a request the host already matched to a
    /// route pattern. `method` is case-insensitive.
    pub fn by_request(&self, method: &str, matched_pattern: &str) -> AppResult<&Operation> {
        let verb = Verb::from_method(method).ok_or_else(|| {
            AppError::OperationNotFound(format!("{} {}", method, matched_pattern))
        })?;
        self.by_route(matched_pattern, verb)
    }

    /// Distinct tags in first-seen order.
    pub fn all_tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Operations carrying `tag`, in document order.
    pub fn operations_with_tag(&self, tag: &str) -> AppResult<Vec<&Operation>> {
        let found: Vec<&Operation> = self
            .operations
            .values()
            .filter(|op| op.tags.iter().any(|t| t == tag))
            .collect();
        if found.is_empty() {
            return Err(AppError::OperationNotFound(format!("tag '{}'", tag)));
        }
        Ok(found)
    }

    /// Operations declared on `pattern`, in document order.
    pub fn operations_with_path(&self, pattern: &str) -> AppResult<Vec<&Operation>> {
        let found: Vec<&Operation> = self
            .operations
            .values()
            .filter(|op| op.route_pattern == pattern)
            .collect();
        if found.is_empty() {
            return Err(AppError::OperationNotFound(format!("path '{}'", pattern)));
        }
        Ok(found)
    }

    /// All operations in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// True when the contract declares no operations.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
