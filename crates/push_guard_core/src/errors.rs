//! Error types for push evaluation.

use std::fmt::Display;

use git_client::CommitId;
use thiserror::Error;

use crate::Severity;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Why a ref update was refused.
///
/// Every variant except [`Rejection::Internal`] is a policy decision and maps
/// to [`Severity::Forbidden`]. The display text is the reason reported back to
/// the pushing client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The user lacks the permission the ref kind requires
    #[error("User permission denied.")]
    PermissionDenied,

    #[error("branch {branch} is the default branch and cannot be deleted")]
    DefaultBranchDeletion { branch: String },

    #[error("branch {branch} is protected from deletion")]
    ProtectedFromDeletion { branch: String },

    #[error("branch {branch} is protected from force push")]
    ForcePush { branch: String },

    #[error("branch {branch} is protected from unverified commit {commit}")]
    UnverifiedCommit { branch: String, commit: CommitId },

    #[error("branch {branch} is protected from changing file {path}")]
    ProtectedFile { branch: String, path: String },

    #[error("Not allowed to push to protected branch {branch}")]
    NotAllowedToPush { branch: String },

    #[error(
        "Not allowed to push to protected branch {branch} and pr #{index} is not ready to be merged: {reason}"
    )]
    PullRequestNotReady {
        branch: String,
        index: i64,
        reason: String,
    },

    #[error("Tag {tag} is protected")]
    ProtectedTag { tag: String },

    #[error("Can't create pull request for an empty repository.")]
    EmptyRepository,

    #[error("Pull requests are not supported on the wiki.")]
    WikiPullRequest,

    /// The base branch of a pull request head ref does not exist
    #[error("Unexpected ref: {ref_name}")]
    UnexpectedRef { ref_name: String },

    /// A collaborator failed; the push cannot be evaluated
    #[error("{context}: {message}")]
    Internal { context: String, message: String },
}

impl Rejection {
    /// Wrap a collaborator failure.
    pub fn internal(context: impl Into<String>, error: impl Display) -> Self {
        Self::Internal {
            context: context.into(),
            message: error.to_string(),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::Internal { .. } => Severity::InternalError,
            _ => Severity::Forbidden,
        }
    }
}

/// Failures of the user, permission and pull request stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// A malformed push request.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The old ids, new ids and ref names were not the same length
    #[error("Mismatched ref update lists: {old} old ids, {new} new ids, {refs} ref names")]
    MismatchedLists { old: usize, new: usize, refs: usize },

    #[error("Invalid commit id: {0}")]
    InvalidCommitId(#[from] git_client::Error),

    /// A line of the pre-receive protocol did not have three fields
    #[error("Malformed ref update line: {0}")]
    MalformedLine(String),
}
