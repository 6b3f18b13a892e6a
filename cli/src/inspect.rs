#![deny(missing_docs)]

//! # Inspect Command
//!
//! Prints a loaded contract's operations grouped by tag, the view a code
//! generator works from.

use std::fmt::Write as _;
use std::path::Path;

use scaffold_core::{AppError, AppResult, Contract, Operation};
use serde::Serialize;

use crate::contract_args::ContractArgs;

/// Output format.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Indented listing.
    #[default]
    Text,
    /// JSON document.
    Json,
    /// YAML document.
    Yaml,
}

/// Arguments for the inspect command.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// Contract location.
    #[clap(flatten)]
    pub contract: ContractArgs,

    /// Output format.
    #[clap(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(Serialize)]
struct Summary<'c> {
    tags: Vec<TagGroup<'c>>,
    untagged: Vec<&'c Operation>,
}

#[derive(Serialize)]
struct TagGroup<'c> {
    tag: &'c str,
    operations: Vec<&'c Operation>,
}

/// Executes the inspect command, printing to stdout.
pub fn execute(args: &InspectArgs, config_path: Option<&Path>) -> AppResult<()> {
    let contract = args.contract.load(config_path)?;
    print!("{}", render(&contract, args.format)?);
    Ok(())
}

/// Renders the contract summary in `format`.
pub fn render(contract: &Contract, format: Format) -> AppResult<String> {
    let summary = summarize(contract)?;
    match format {
        Format::Text => Ok(render_text(&summary)),
        Format::Json => serde_json::to_string_pretty(&summary)
            .map(|s| s + "\n")
            .map_err(|e| AppError::Internal(format!("Failed to render JSON: {}", e))),
        Format::Yaml => serde_yaml::to_string(&summary)
            .map_err(|e| AppError::Internal(format!("Failed to render YAML: {}", e))),
    }
}

fn summarize(contract: &Contract) -> AppResult<Summary<'_>> {
    let index = contract.index();
    let tags = index
        .all_tags()
        .map(|tag| {
            Ok(TagGroup {
                tag,
                operations: index.operations_with_tag(tag)?,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;
    let untagged = index.iter().filter(|op| op.tags.is_empty()).collect();
    Ok(Summary { tags, untagged })
}

fn render_text(summary: &Summary<'_>) -> String {
    let mut out = String::new();
    let groups = summary
        .tags
        .iter()
        .map(|g| (g.tag, &g.operations))
        .chain(
            Some(("(untagged)", &summary.untagged)).filter(|(_, ops)| !ops.is_empty()),
        );
    for (tag, operations) in groups {
        let _ = writeln!(out, "{}", tag);
        for op in operations {
            let _ = writeln!(
                out,
                "  {:<7} {} {}",
                op.verb.as_str().to_uppercase(),
                op.route_pattern,
                op.id
            );
        }
    }
    out
}
