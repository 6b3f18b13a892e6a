//! Arguments shared by every command that loads a contract.

use std::path::{Path, PathBuf};

use scaffold_core::{AppResult, Contract, ContractConfig};

/// Where to find the contract.
#[derive(clap::Args, Debug, Clone)]
pub struct ContractArgs {
    /// Path to the OpenAPI contract (YAML or JSON).
    #[clap(long, env = "SCAFFOLD_SPEC", default_value = "docs/openapi.yaml")]
    pub spec: PathBuf,
}

impl ContractArgs {
    /// Loads the contract with settings from `config_path`, or defaults.
    pub fn load(&self, config_path: Option<&Path>) -> AppResult<Contract> {
        let config = match config_path {
            Some(path) => ContractConfig::from_file(path)?,
            None => ContractConfig::default(),
        };
        Contract::from_file(&self.spec, config)
    }
}
