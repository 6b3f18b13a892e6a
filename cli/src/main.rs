#![deny(missing_docs)]

//! # Scaffold CLI
//!
//! Command Line Interface over `scaffold-core`.
//!
//! Supported Commands:
//! - `inspect`: Lists a contract's operations grouped by tag.
//! - `check`: Loads a contract and compiles every authentication chain.
//! - `simulate`: Runs one synthetic request through the request pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use scaffold_core::AppResult;

mod check;
mod contract_args;
mod inspect;
mod logging;
mod simulate;

#[derive(Parser, Debug)]
#[clap(author, version, about = "API contract toolchain")]
struct Cli {
    /// Log filter directives, e.g. `info` or `scaffold_core=debug`.
    #[clap(long, global = true, env = "SCAFFOLD_LOG", default_value = "warn")]
    log_level: String,

    /// YAML file with contract settings.
    #[clap(long, global = true, env = "SCAFFOLD_CONFIG")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List operations grouped by tag.
    Inspect(inspect::InspectArgs),
    /// Load a contract and compile all of it eagerly.
    Check(check::CheckArgs),
    /// Run one request through the contract's pipeline.
    Simulate(simulate::SimulateArgs),
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level)?;
    let config = cli.config.as_deref();

    match &cli.command {
        Commands::Inspect(args) => inspect::execute(args, config)?,
        Commands::Check(args) => check::execute(args, config)?,
        Commands::Simulate(args) => simulate::execute(args, config)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scaffold",
            "inspect",
            "--spec",
            "api.yaml",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.contract.spec, PathBuf::from("api.yaml"));
                assert_eq!(args.format, inspect::Format::Json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
