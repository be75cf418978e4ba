//! The `validate` command.

use std::path::PathBuf;

use clap::Args;
use tracing::{info, instrument};

use crate::config::AppConfig;
use crate::errors::Error;

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,
}

/// Summary of a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationSummary {
    pub branch_rules: usize,
    pub tag_rules: usize,
    pub users: usize,
}

/// Load the configuration and check every rule it holds.
#[instrument]
pub fn execute(args: &ValidateArgs) -> Result<ValidationSummary, Error> {
    let config = AppConfig::load(&args.config)?;
    config.validate()?;

    let summary = ValidationSummary {
        branch_rules: config.branches.len(),
        tag_rules: config.tags.len(),
        users: config.users.len(),
    };
    info!(
        repository = %config.repository.full_name(),
        branch_rules = summary.branch_rules,
        tag_rules = summary.tag_rules,
        "Configuration is valid"
    );
    Ok(summary)
}
