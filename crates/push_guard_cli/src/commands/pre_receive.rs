//! The `pre-receive` command.
//!
//! Git runs the hook once per push with one `<old> <new> <ref>` line per
//! updated ref on standard input. Objects of the push are still held in
//! quarantine; git exports their location through the environment.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use git_client::{
    Git2PlumbingClient, GitEnvironment, GitPlumbingClient, GpgVerifier,
    GIT_ALTERNATIVE_OBJECT_DIRECTORIES, GIT_OBJECT_DIRECTORY, GIT_QUARANTINE_PATH,
};
use protection_rules::{InMemoryRuleStore, UserId};
use push_guard_core::{
    Decision, EngineSettings, HookOptions, PolicyServices, PushContext, RefUpdate,
    RefUpdateDispatcher, RepositoryInfo, Severity,
};
use tracing::{debug, info, instrument};

use crate::config::AppConfig;
use crate::directory::ConfigDirectory;
use crate::errors::Error;

#[cfg(test)]
#[path = "pre_receive_tests.rs"]
mod tests;

pub const EXIT_ALLOW: i32 = 0;
pub const EXIT_FORBIDDEN: i32 = 1;
pub const EXIT_INTERNAL_ERROR: i32 = 2;

#[derive(Args, Debug, Clone)]
pub struct PreReceiveArgs {
    /// Path to the configuration file
    #[arg(short, long)]
    pub config: PathBuf,

    /// Path to the repository receiving the push
    #[arg(short, long, default_value = ".")]
    pub repository: PathBuf,

    /// Id of the pushing user
    #[arg(short, long)]
    pub user_id: i64,

    /// The push authenticates with a deploy key
    #[arg(long)]
    pub deploy_key: bool,

    /// Id of the pull request this push merges
    #[arg(long)]
    pub pull_request_id: Option<i64>,

    /// The push targets the wiki repository
    #[arg(long)]
    pub wiki: bool,

    /// Treat `refs/for/*` pushes as pull request requests
    #[arg(long)]
    pub proc_receive: bool,

    /// Print the response as JSON on standard output
    #[arg(long)]
    pub json: bool,
}

/// Exit status of the hook for a decision.
pub fn exit_code(decision: &Decision) -> i32 {
    match decision.severity() {
        None => EXIT_ALLOW,
        Some(Severity::Forbidden) => EXIT_FORBIDDEN,
        Some(Severity::InternalError) => EXIT_INTERNAL_ERROR,
    }
}

/// Parse the ref update lines of the pre-receive protocol. Blank lines are
/// skipped.
pub fn read_ref_updates(input: impl BufRead) -> Result<Vec<RefUpdate>, Error> {
    let mut updates = Vec::new();
    for (number, line) in input.lines().enumerate() {
        let line = line.map_err(Error::ReadInput)?;
        if line.trim().is_empty() {
            continue;
        }
        let update = RefUpdate::parse_line(&line)
            .map_err(|e| Error::Input(format!("line {}: {}", number + 1, e)))?;
        updates.push(update);
    }
    Ok(updates)
}

/// Evaluate the push described by `input` against the configured rules.
#[instrument(skip(input))]
pub async fn execute(
    args: &PreReceiveArgs,
    env: GitEnvironment,
    input: impl BufRead,
) -> Result<Decision, Error> {
    let config = AppConfig::load(&args.config)?;
    config.validate()?;

    let git = Git2PlumbingClient::new(&args.repository, Arc::new(GpgVerifier::new()));
    let default_branch = match &config.repository.default_branch {
        Some(branch) => branch.clone(),
        None => git.head_branch()?.ok_or_else(|| {
            Error::Config("No default_branch configured and HEAD is detached".to_string())
        })?,
    };
    let repository = RepositoryInfo {
        owner: config.repository.owner.clone(),
        name: config.repository.name.clone(),
        default_branch,
        is_empty: git.is_empty(&env).await?,
    };

    let options = HookOptions {
        is_deploy_key: args.deploy_key,
        pull_request_id: args.pull_request_id.unwrap_or(0),
        is_wiki: args.wiki,
        ref_updates: read_ref_updates(input)?,
        git_alternative_object_directories: env
            .get(GIT_ALTERNATIVE_OBJECT_DIRECTORIES)
            .map(str::to_string),
        git_object_directory: env.get(GIT_OBJECT_DIRECTORY).map(str::to_string),
        git_quarantine_path: env.get(GIT_QUARANTINE_PATH).map(str::to_string),
        ..HookOptions::new(UserId::new(args.user_id))
    };
    debug!(
        repository = %repository.full_name(),
        updates = options.ref_updates.len(),
        "Evaluating push"
    );

    let directory = Arc::new(ConfigDirectory::from_config(&config));
    let rules = InMemoryRuleStore::new().with_rules(repository.full_name(), config.rule_set());
    let services = PolicyServices::new(
        Arc::new(git),
        Arc::new(rules),
        directory.clone(),
        directory.clone(),
        directory,
    );
    let settings = EngineSettings {
        support_proc_receive: args.proc_receive || config.engine.support_proc_receive,
    };

    let mut ctx = PushContext::new(repository, options);
    let decision = RefUpdateDispatcher::new(services, settings)
        .run(&mut ctx)
        .await;
    info!(status = %decision.status(), "Push evaluated");
    Ok(decision)
}
