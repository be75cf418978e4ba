//! Git plumbing operations used to evaluate pushes.
//!
//! This crate answers questions about the commits of a push: whether an update
//! is a fast-forward, which files it touches, whether its commits are signed,
//! whether a branch exists. It never makes policy decisions; the push policy
//! engine consumes the answers through the [`GitPlumbingClient`] trait.
//!
//! [`Git2PlumbingClient`] is the implementation backed by `git2`.

use async_trait::async_trait;

pub mod errors;
pub use errors::Error;

mod commit_id;
pub use commit_id::{CommitId, EMPTY_SHA};

mod environment;
pub use environment::{
    GitEnvironment, GIT_ALTERNATIVE_OBJECT_DIRECTORIES, GIT_OBJECT_DIRECTORY, GIT_QUARANTINE_PATH,
};

mod patterns;
pub use patterns::FilePatterns;

mod signature;
pub use signature::{GpgVerifier, SignatureVerifier, VerificationOutcome};

mod repository;
pub use repository::Git2PlumbingClient;

/// Read-only git operations against the repository receiving a push.
///
/// Every method takes the [`GitEnvironment`] of the push so that objects still
/// held in quarantine are taken into account. Any `Err` is an infrastructure
/// failure; policy-relevant answers are always carried in the `Ok` value.
#[async_trait]
pub trait GitPlumbingClient: Send + Sync {
    /// Whether `ancestor` is reachable from `descendant`.
    ///
    /// An update from `old` to `new` is a force push exactly when
    /// `is_ancestor(old, new)` is `false`.
    async fn is_ancestor(
        &self,
        env: &GitEnvironment,
        ancestor: &CommitId,
        descendant: &CommitId,
    ) -> Result<bool, Error>;

    /// Files changed between `old` and `new` that match any of `patterns`.
    ///
    /// At most `limit` paths are returned; `0` means no limit.
    async fn matched_files(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
        patterns: &FilePatterns,
        limit: usize,
    ) -> Result<Vec<String>, Error>;

    /// Whether every file changed between `old` and `new` matches one of `patterns`.
    async fn only_matching_files(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
        patterns: &FilePatterns,
    ) -> Result<bool, Error>;

    /// Check the signatures of every commit introduced between `old` and `new`.
    async fn verify_commits(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
    ) -> Result<VerificationOutcome, Error>;

    /// Whether a local branch with this short name exists.
    async fn branch_exists(&self, env: &GitEnvironment, name: &str) -> Result<bool, Error>;

    /// Whether the repository has no commits at all.
    async fn is_empty(&self, env: &GitEnvironment) -> Result<bool, Error>;
}
