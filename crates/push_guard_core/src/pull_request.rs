//! Pull requests a push may be merging.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Permission, StoreError, User};

/// Database id of a pull request (not the per-repository index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestId(i64);

impl PullRequestId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PullRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PullRequestId,
    /// Number shown to users, `#index`
    pub index: i64,
    pub base_branch: String,
    /// Full name of the repository the changes come from
    pub head_repo: String,
}

/// Whether a pull request satisfies its merge checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeReadiness {
    Ready,
    NotReady(String),
}

/// Pull request lookups and merge checks.
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    async fn pull_request_by_id(&self, id: PullRequestId) -> Result<PullRequest, StoreError>;

    /// Whether `user` may merge the pull request into its base branch.
    async fn is_user_allowed_to_merge(
        &self,
        pull_request: &PullRequest,
        permission: &Permission,
        user: &User,
    ) -> Result<bool, StoreError>;

    /// Approvals, status checks and other merge requirements.
    async fn check_ready_to_merge(
        &self,
        pull_request: &PullRequest,
    ) -> Result<MergeReadiness, StoreError>;
}
