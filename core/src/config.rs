//! # Configuration
//!
//! Tunables for contract compilation and request validation. Every field has a
//! default, so a config file only needs to mention what it changes.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Validation behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fail with `UnknownParameter` when a body carries undeclared fields.
    pub reject_unknown_body_fields: bool,
    /// Accept `yes`/`no`, `1`/`0`, `on`/`off` etc. for boolean parameters.
    pub lenient_booleans: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            reject_unknown_body_fields: true,
            lenient_booleans: true,
        }
    }
}

/// Authentication chain behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Compile every operation's chain while loading instead of on first use.
    pub precompile: bool,
}

/// Top-level configuration for a loaded [`crate::Contract`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Validation settings.
    pub validation: ValidationConfig,
    /// Security settings.
    pub security: SecurityConfig,
}

impl ContractConfig {
    /// Rejects unknown body fields, only accepts `true`/`false` for booleans and
    /// surfaces unsupported security schemes at load.
    pub fn strict() -> Self {
        Self {
            validation: ValidationConfig {
                reject_unknown_body_fields: true,
                lenient_booleans: false,
            },
            security: SecurityConfig { precompile: true },
        }
    }

    /// Ignores unknown body fields and compiles chains lazily.
    pub fn permissive() -> Self {
        Self {
            validation: ValidationConfig {
                reject_unknown_body_fields: false,
                lenient_booleans: true,
            },
            security: SecurityConfig { precompile: false },
        }
    }

    /// Parses a YAML (or JSON) configuration document.
    pub fn from_yaml_str(yaml: &str) -> AppResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| AppError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }
}
