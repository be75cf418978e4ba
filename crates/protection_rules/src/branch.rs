//! Branch protection rules.

use git_client::FilePatterns;
use glob::{MatchOptions, Pattern};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{RuleError, TeamId, TeamMembership, UserId};

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;

// Branch globs do not cross `/`: `release/*` matches `release/1.0` only.
const BRANCH_MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn default_protected() -> bool {
    true
}

/// Protection settings for a branch.
///
/// # Example TOML
///
/// ```toml
/// [[branches]]
/// branch_name = "main"
/// can_push = true
/// enable_whitelist = true
/// whitelist_user_ids = [1]
/// require_signed_commits = true
/// protected_file_patterns = ["*.secrets"]
/// unprotected_file_patterns = ["docs/**"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchProtectionRule {
    /// Exact branch name or a glob over branch names
    pub branch_name: String,

    /// Whether the rule is active
    #[serde(default = "default_protected")]
    pub protected: bool,

    /// Whether direct pushes are possible at all
    #[serde(default)]
    pub can_push: bool,

    /// Restrict direct pushes to the whitelisted users and teams
    #[serde(default)]
    pub enable_whitelist: bool,

    #[serde(default)]
    pub whitelist_user_ids: Vec<UserId>,

    #[serde(default)]
    pub whitelist_team_ids: Vec<TeamId>,

    /// Whether deploy keys may push while the whitelist is enabled
    #[serde(default)]
    pub whitelist_deploy_keys: bool,

    #[serde(default)]
    pub require_signed_commits: bool,

    /// Files that only privileged merges may change
    #[serde(default)]
    pub protected_file_patterns: Vec<String>,

    /// Files anyone with write access may change with a direct push
    #[serde(default)]
    pub unprotected_file_patterns: Vec<String>,
}

impl BranchProtectionRule {
    /// An active rule for `branch_name` with every other setting off.
    pub fn new(branch_name: impl Into<String>) -> Self {
        Self {
            branch_name: branch_name.into(),
            protected: true,
            can_push: false,
            enable_whitelist: false,
            whitelist_user_ids: Vec::new(),
            whitelist_team_ids: Vec::new(),
            whitelist_deploy_keys: false,
            require_signed_commits: false,
            protected_file_patterns: Vec::new(),
            unprotected_file_patterns: Vec::new(),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Whether this rule applies to the branch, by exact name or glob.
    pub fn matches_branch(&self, branch: &str) -> bool {
        if self.branch_name == branch {
            return true;
        }
        Pattern::new(&self.branch_name)
            .map(|pattern| pattern.matches_with(branch, BRANCH_MATCH_OPTIONS))
            .unwrap_or(false)
    }

    pub fn protected_file_patterns(&self) -> FilePatterns {
        FilePatterns::parse(&self.protected_file_patterns)
    }

    pub fn unprotected_file_patterns(&self) -> FilePatterns {
        FilePatterns::parse(&self.unprotected_file_patterns)
    }

    /// Whether `user` may push directly to the branch.
    ///
    /// Without a whitelist every user with write access to the code may push.
    /// With a whitelist the user must be listed or belong to a listed team. A
    /// failed team lookup is logged and counts as not whitelisted.
    pub async fn can_user_push(
        &self,
        user: UserId,
        can_write_code: bool,
        teams: &dyn TeamMembership,
    ) -> bool {
        if !self.can_push {
            return false;
        }
        if !self.enable_whitelist {
            return can_write_code;
        }
        if self.whitelist_user_ids.contains(&user) {
            return true;
        }
        if self.whitelist_team_ids.is_empty() {
            return false;
        }
        match teams.is_user_in_teams(user, &self.whitelist_team_ids).await {
            Ok(in_team) => in_team,
            Err(e) => {
                error!(user_id = %user, branch = %self.branch_name, "Unable to check team whitelist: {}", e);
                false
            }
        }
    }

    /// Check that the branch glob and every file pattern compile.
    pub fn validate(&self) -> Result<(), RuleError> {
        Pattern::new(&self.branch_name).map_err(|e| RuleError::InvalidBranchPattern {
            pattern: self.branch_name.clone(),
            message: e.to_string(),
        })?;
        for patterns in [&self.protected_file_patterns, &self.unprotected_file_patterns] {
            FilePatterns::try_parse(patterns).map_err(|source| RuleError::InvalidFilePattern {
                branch: self.branch_name.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
