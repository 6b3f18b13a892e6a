#![deny(missing_docs)]

//! # Contract Loading
//!
//! Turns a raw OpenAPI document into a loaded [`Contract`]: resolved,
//! normalized, indexed, with every operation's validators compiled.
//! Authentication chains are compiled on first use and cached on the contract.

use crate::auth::{CallerContext, MechanismChain, PrincipalResolver};
use crate::config::ContractConfig;
use crate::error::{AppError, AppResult};
use crate::oas::index::OperationIndex;
use crate::oas::models::{Operation, SecurityScheme};
use crate::oas::normalization::normalize;
use crate::oas::resolver::resolve_references;
use crate::request::RequestView;
use crate::validation::OperationValidators;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A loaded contract.
///
/// Immutable after construction apart from the chain cache, so a single
/// instance can be shared across request handlers.
#[derive(Debug)]
pub struct Contract {
    document: Value,
    source_location: Option<PathBuf>,
    security_schemes: IndexMap<String, SecurityScheme>,
    index: OperationIndex,
    validators: HashMap<String, OperationValidators>,
    chains: RwLock<HashMap<String, Arc<MechanismChain>>>,
    config: ContractConfig,
}

impl Contract {
    /// Loads a contract from a document, leaving the caller's value untouched.
    pub fn from_value(document: &Value, config: ContractConfig) -> AppResult<Self> {
        Self::load(document.clone(), None, config)
    }

    /// Parses and loads a YAML document.
    pub fn from_yaml_str(yaml: &str, config: ContractConfig) -> AppResult<Self> {
        let document: Value = serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Parse(format!("Failed to parse contract YAML: {}", e)))?;
        Self::load(document, None, config)
    }

    /// Parses and loads a JSON document.
    pub fn from_json_str(json: &str, config: ContractConfig) -> AppResult<Self> {
        let document: Value = serde_json::from_str(json)
            .map_err(|e| AppError::Parse(format!("Failed to parse contract JSON: {}", e)))?;
        Self::load(document, None, config)
    }

    /// Reads and loads a contract file. YAML and JSON are both accepted.
    pub fn from_file(path: impl AsRef<Path>, config: ContractConfig) -> AppResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let document: Value = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Parse(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        Self::load(document, Some(path.to_path_buf()), config)
    }

    fn load(
        mut document: Value,
        source_location: Option<PathBuf>,
        config: ContractConfig,
    ) -> AppResult<Self> {
        if !document.is_object() {
            return Err(AppError::InvalidContract(
                "Contract root must be a mapping".to_string(),
            ));
        }

        resolve_references(&mut document)?;
        normalize(&mut document);

        let security_schemes = parse_security_schemes(&document)?;
        let index = OperationIndex::build(&document)?;

        let mut validators = HashMap::with_capacity(index.len());
        for operation in index.iter() {
            let compiled = OperationValidators::compile(operation, &config.validation)?;
            validators.insert(operation.id.clone(), compiled);
        }

        let contract = Self {
            document,
            source_location,
            security_schemes,
            index,
            validators,
            chains: RwLock::new(HashMap::new()),
            config,
        };

        if contract.config.security.precompile {
            for operation in contract.index.iter() {
                contract.mechanism_chain(&operation.id)?;
            }
        }

        debug!(
            operations = contract.index.len(),
            schemes = contract.security_schemes.len(),
            source = ?contract.source_location,
            "loaded contract"
        );
        Ok(contract)
    }

    /// The resolved and normalized document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Where the contract was read from, if it came from a file.
    pub fn source_location(&self) -> Option<&Path> {
        self.source_location.as_deref()
    }

    /// `components.securitySchemes`, in declaration order.
    pub fn security_schemes(&self) -> &IndexMap<String, SecurityScheme> {
        &self.security_schemes
    }

    /// The operation index.
    pub fn index(&self) -> &OperationIndex {
        &self.index
    }

    /// The configuration the contract was loaded with.
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Shorthand for `self.index().by_id(id)`.
    pub fn operation(&self, id: &str) -> AppResult<&Operation> {
        self.index.by_id(id)
    }

    /// Compiled validators for an operation.
    pub fn validators(&self, operation_id: &str) -> AppResult<&OperationValidators> {
        self.validators
            .get(operation_id)
            .ok_or_else(|| AppError::OperationNotFound(operation_id.to_string()))
    }

    /// The authentication chain for an operation, compiling it on first use.
    ///
    /// Compilation failures are not cached; every later call fails the same way.
    pub fn mechanism_chain(&self, operation_id: &str) -> AppResult<Arc<MechanismChain>> {
        if let Some(chain) = self.chains.read().get(operation_id) {
            return Ok(Arc::clone(chain));
        }

        let operation = self.index.by_id(operation_id)?;
        let compiled = Arc::new(MechanismChain::compile(operation, &self.security_schemes)?);

        let mut chains = self.chains.write();
        let chain = chains
            .entry(operation_id.to_string())
            .or_insert(compiled);
        Ok(Arc::clone(chain))
    }

    /// Runs the operation's authentication chain and binds the caller.
    pub fn authenticate<R: PrincipalResolver + ?Sized>(
        &self,
        operation_id: &str,
        request: &dyn RequestView,
        resolver: &R,
        context: &mut CallerContext<R::Identity>,
    ) -> AppResult<()> {
        self.mechanism_chain(operation_id)?
            .authenticate(request, resolver, context)
    }
}

fn parse_security_schemes(document: &Value) -> AppResult<IndexMap<String, SecurityScheme>> {
    let Some(raw) = document
        .pointer("/components/securitySchemes")
        .filter(|v| !v.is_null())
    else {
        return Ok(IndexMap::new());
    };
    serde_json::from_value(raw.clone()).map_err(|e| {
        AppError::InvalidContract(format!("Failed to parse components.securitySchemes: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Mechanism;
    use serde_json::json;

    const WIDGETS: &str = r#"
openapi: 3.0.0
components:
  securitySchemes:
    bearerAuth: {type: http, scheme: bearer}
    oauth: {type: oauth2}
  parameters:
    WidgetId: {name: id, in: path, schema: {type: string}}
paths:
  /widgets/{id}:
    parameters:
      - $ref: '#/components/parameters/WidgetId'
    get:
      operationId: getWidget
      security:
        - bearerAuth: []
        - {}
    delete:
      operationId: deleteWidget
      security:
        - oauth: []
"#;

    #[test]
    fn test_load_resolves_and_normalizes() {
        let contract = Contract::from_yaml_str(WIDGETS, ContractConfig::default()).unwrap();
        let get = contract.operation("getWidget").unwrap();
        assert_eq!(get.parameters.len(), 1);
        assert_eq!(get.parameters[0].name, "id");
        assert!(get.allows_anonymous());
        assert_eq!(contract.security_schemes().len(), 2);
        assert!(contract.source_location().is_none());
        assert!(!crate::oas::resolver::contains_references(contract.document()));
    }

    #[test]
    fn test_caller_document_untouched() {
        let raw: Value = serde_yaml::from_str(WIDGETS).unwrap();
        let before = raw.clone();
        Contract::from_value(&raw, ContractConfig::default()).unwrap();
        assert_eq!(raw, before);
    }

    #[test]
    fn test_chain_is_lazy_and_cached() {
        let contract = Contract::from_yaml_str(WIDGETS, ContractConfig::default()).unwrap();
        let first = contract.mechanism_chain("getWidget").unwrap();
        assert_eq!(first.mechanisms(), &[Mechanism::Bearer, Mechanism::None]);
        let second = contract.mechanism_chain("getWidget").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(matches!(
            contract.mechanism_chain("deleteWidget"),
            Err(AppError::UnsupportedSecurityScheme(_))
        ));
    }

    #[test]
    fn test_precompile_fails_at_load() {
        let err = Contract::from_yaml_str(WIDGETS, ContractConfig::strict()).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedSecurityScheme(_)));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let err = Contract::from_value(&json!([1, 2]), ContractConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidContract(_)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Contract::from_yaml_str("paths: [", ContractConfig::default()),
            Err(AppError::Parse(_))
        ));
        assert!(matches!(
            Contract::from_json_str("{", ContractConfig::default()),
            Err(AppError::Parse(_))
        ));
    }

    #[test]
    fn test_bad_default_fails_load() {
        let yaml = r#"
paths:
  /items:
    get:
      operationId: listItems
      parameters:
        - {name: limit, in: query, required: false, schema: {type: integer, default: many}}
"#;
        let err = Contract::from_yaml_str(yaml, ContractConfig::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidContract(_)));
    }

    #[test]
    fn test_from_file_records_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("api.yaml");
        std::fs::write(&path, WIDGETS).unwrap();
        let contract = Contract::from_file(&path, ContractConfig::default()).unwrap();
        assert_eq!(contract.source_location(), Some(path.as_path()));
        assert_eq!(contract.index().len(), 2);
    }
}
