//! In-memory rule store.
//!
//! Holds the rule sets of one or more repositories, typically loaded from a
//! TOML file, and serves them through [`ProtectionRuleStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{BranchProtectionRule, ProtectionRuleStore, RuleError, TagProtectionRule};

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

/// The protection rules of one repository.
///
/// ```toml
/// [[branches]]
/// branch_name = "main"
///
/// [[tags]]
/// name_pattern = "v*"
/// allowlist_user_ids = [1]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub branches: Vec<BranchProtectionRule>,

    #[serde(default)]
    pub tags: Vec<TagProtectionRule>,
}

impl RuleSet {
    /// Parse a rule set from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, RuleError> {
        Ok(toml::from_str(content)?)
    }

    /// The rule governing `branch`.
    ///
    /// A rule naming the branch exactly wins over glob rules; among glob rules
    /// the first in file order wins.
    pub fn branch_rule(&self, branch: &str) -> Option<&BranchProtectionRule> {
        self.branches
            .iter()
            .find(|rule| rule.branch_name == branch)
            .or_else(|| self.branches.iter().find(|rule| rule.matches_branch(branch)))
    }

    /// Compile every pattern, reporting the first that is invalid.
    pub fn validate(&self) -> Result<(), RuleError> {
        for rule in &self.branches {
            rule.validate()?;
        }
        for rule in &self.tags {
            rule.compile()?;
        }
        Ok(())
    }
}

/// Rule store keyed by repository full name (`owner/name`).
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleStore {
    repositories: HashMap<String, RuleSet>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the rules of a repository.
    pub fn insert(&mut self, repository: impl Into<String>, rules: RuleSet) {
        self.repositories.insert(repository.into(), rules);
    }

    pub fn with_rules(mut self, repository: impl Into<String>, rules: RuleSet) -> Self {
        self.insert(repository, rules);
        self
    }
}

#[async_trait]
impl ProtectionRuleStore for InMemoryRuleStore {
    async fn branch_rule(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Option<BranchProtectionRule>, RuleError> {
        let rule = self
            .repositories
            .get(repository)
            .and_then(|rules| rules.branch_rule(branch))
            .cloned();
        debug!(repository, branch, found = rule.is_some(), "Looked up branch rule");
        Ok(rule)
    }

    async fn tag_rules(&self, repository: &str) -> Result<Vec<TagProtectionRule>, RuleError> {
        Ok(self
            .repositories
            .get(repository)
            .map(|rules| rules.tags.clone())
            .unwrap_or_default())
    }
}
