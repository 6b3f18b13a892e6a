#![deny(missing_docs)]

//! # Check Command
//!
//! Loads a contract and compiles everything that would otherwise be compiled
//! lazily, so broken security schemes surface before deployment.

use std::path::Path;

use scaffold_core::{AppResult, Contract};
use tracing::info;

use crate::contract_args::ContractArgs;

/// Arguments for the check command.
#[derive(clap::Args, Debug, Clone)]
pub struct CheckArgs {
    /// Contract location.
    #[clap(flatten)]
    pub contract: ContractArgs,
}

/// Executes the check command.
pub fn execute(args: &CheckArgs, config_path: Option<&Path>) -> AppResult<()> {
    let contract = args.contract.load(config_path)?;
    println!("{}", check(&contract)?);
    Ok(())
}

/// Compiles every authentication chain and returns a one-line report.
pub fn check(contract: &Contract) -> AppResult<String> {
    for operation in contract.index().iter() {
        let chain = contract.mechanism_chain(&operation.id)?;
        info!(
            operation = %operation.id,
            mechanisms = chain.mechanisms().len(),
            "checked operation"
        );
    }
    Ok(format!(
        "ok: {} operations, {} security schemes",
        contract.index().len(),
        contract.security_schemes().len()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract_args::ContractArgs;
    use scaffold_core::{AppError, ContractConfig};
    use std::fs;

    #[test]
    fn test_check_reports_counts() {
        let yaml = r#"
components:
  securitySchemes:
    bearerAuth: {type: http, scheme: bearer}
paths:
  /a:
    get: {operationId: a, security: [{bearerAuth: []}, {}]}
  /b:
    get: {operationId: b}
"#;
        let contract = Contract::from_yaml_str(yaml, ContractConfig::default()).unwrap();
        assert_eq!(check(&contract).unwrap(), "ok: 2 operations, 1 security schemes");
    }

    #[test]
    fn test_check_surfaces_unsupported_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("api.yaml");
        fs::write(
            &spec,
            r#"
components:
  securitySchemes:
    oauth: {type: oauth2}
paths:
  /a:
    get: {operationId: a, security: [{oauth: []}]}
"#,
        )
        .unwrap();

        let args = CheckArgs {
            contract: ContractArgs { spec },
        };
        let contract = args.contract.load(None).unwrap();
        assert!(matches!(
            check(&contract),
            Err(AppError::UnsupportedSecurityScheme(_))
        ));
    }
}
