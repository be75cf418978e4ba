//! Configuration file of the push-guard hook.
//!
//! One TOML file describes the repository the hook is installed in, its
//! protection rules, and the users, teams and pull requests the rules refer
//! to.

use std::{fs, path::Path};

use protection_rules::{BranchProtectionRule, RuleSet, TagProtectionRule, TeamId, UserId};
use push_guard_core::{AccessMode, EngineSettings, PullRequestId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::Error;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure of the push-guard CLI.
///
/// # Example TOML Configuration
///
/// ```toml
/// [repository]
/// owner = "acme"
/// name = "app"
/// default_branch = "main"
///
/// [[branches]]
/// branch_name = "main"
/// enable_whitelist = true
/// whitelist_user_ids = [1]
///
/// [[tags]]
/// name_pattern = "v*"
/// allowlist_user_ids = [1]
///
/// [[users]]
/// id = 1
/// name = "alice"
/// code = "write"
/// pull_requests = "write"
///
/// [[teams]]
/// id = 4
/// members = [1]
///
/// [[pull_requests]]
/// id = 12
/// index = 3
/// base_branch = "main"
/// head_repo = "acme/app"
/// mergers = [1]
/// ready = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub branches: Vec<BranchProtectionRule>,

    #[serde(default)]
    pub tags: Vec<TagProtectionRule>,

    #[serde(default)]
    pub users: Vec<UserConfig>,

    #[serde(default)]
    pub teams: Vec<TeamConfig>,

    #[serde(default)]
    pub pull_requests: Vec<PullRequestConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,

    /// Falls back to the branch HEAD points at
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl RepositoryConfig {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: UserId,
    pub name: String,

    /// Site administrator
    #[serde(default)]
    pub admin: bool,

    #[serde(default)]
    pub code: AccessMode,

    #[serde(default)]
    pub pull_requests: AccessMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub id: TeamId,

    #[serde(default)]
    pub members: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestConfig {
    pub id: PullRequestId,
    pub index: i64,
    pub base_branch: String,
    pub head_repo: String,

    /// Users allowed to merge besides administrators
    #[serde(default)]
    pub mergers: Vec<UserId>,

    #[serde(default)]
    pub ready: bool,

    #[serde(default)]
    pub not_ready_reason: Option<String>,
}

impl AppConfig {
    /// Loads configuration from a TOML file at the specified path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the file does not exist, cannot be read or
    /// does not match the configuration schema.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// The protection rules of the configured repository.
    pub fn rule_set(&self) -> RuleSet {
        RuleSet {
            branches: self.branches.clone(),
            tags: self.tags.clone(),
        }
    }

    /// Check that every pattern compiles and that ids are unique.
    pub fn validate(&self) -> Result<(), Error> {
        if self.repository.owner.is_empty() || self.repository.name.is_empty() {
            return Err(Error::Config(
                "Repository owner and name must not be empty".to_string(),
            ));
        }

        self.rule_set()
            .validate()
            .map_err(|e| Error::Config(format!("Invalid protection rule: {}", e)))?;

        let mut user_ids: Vec<_> = self.users.iter().map(|u| u.id).collect();
        user_ids.sort();
        if let Some(pair) = user_ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::Config(format!("Duplicate user id {}", pair[0])));
        }

        let mut pull_request_ids: Vec<_> =
            self.pull_requests.iter().map(|p| p.id.value()).collect();
        pull_request_ids.sort();
        if let Some(pair) = pull_request_ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::Config(format!(
                "Duplicate pull request id {}",
                pair[0]
            )));
        }

        Ok(())
    }
}
