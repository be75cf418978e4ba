//! Branch and tag protection rules.
//!
//! This crate defines the protection rule types consulted when a push is
//! evaluated, the [`ProtectionRuleStore`] and [`TeamMembership`] provider
//! traits the engine reads them through, and the tag allow-list decision
//! [`is_user_allowed_to_control_tag`].
//!
//! Rules are read-only while a push is evaluated. [`InMemoryRuleStore`] serves
//! rule sets loaded from TOML; other stores (a database, an API) implement the
//! same trait.

use async_trait::async_trait;

pub mod errors;
pub use errors::RuleError;

mod ids;
pub use ids::{TeamId, UserId};

mod branch;
pub use branch::BranchProtectionRule;

mod tag;
pub use tag::{is_user_allowed_to_control_tag, TagNamePattern, TagProtectionRule};

mod store;
pub use store::{InMemoryRuleStore, RuleSet};

/// Source of the protection rules of a repository.
///
/// Repositories are identified by their full name, `owner/name`.
#[async_trait]
pub trait ProtectionRuleStore: Send + Sync {
    /// The rule protecting `branch`, or `None` when the branch has no rule.
    ///
    /// # Errors
    ///
    /// * `RuleError::Store` - the store could not be read
    async fn branch_rule(
        &self,
        repository: &str,
        branch: &str,
    ) -> Result<Option<BranchProtectionRule>, RuleError>;

    /// Every tag rule of the repository, in store order.
    async fn tag_rules(&self, repository: &str) -> Result<Vec<TagProtectionRule>, RuleError>;
}

/// Resolves team membership for allow-lists and whitelists.
#[async_trait]
pub trait TeamMembership: Send + Sync {
    /// Whether `user` belongs to at least one of `teams`.
    async fn is_user_in_teams(&self, user: UserId, teams: &[TeamId]) -> Result<bool, RuleError>;
}
