//! Error types for git plumbing operations.
//!
//! Every failure of the plumbing layer is an infrastructure failure from the
//! point of view of the policy engine. Policy outcomes such as "this commit is
//! not signed" are never reported through this type; they are returned as
//! regular values (see [`crate::VerificationOutcome`]).

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur while running git plumbing operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A commit id was not a 40 or 64 character hexadecimal string.
    #[error("Invalid commit id '{0}'")]
    InvalidCommitId(String),

    /// The repository could not be opened.
    ///
    /// Parameters: path, underlying message
    #[error("Failed to open repository at {path}: {message}")]
    OpenRepository { path: String, message: String },

    /// A git operation against an opened repository failed.
    #[error("Git operation '{operation}' failed: {message}")]
    GitOperation { operation: String, message: String },

    /// A file glob could not be compiled.
    #[error("Invalid file pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// A git operation running on the blocking thread pool panicked or was cancelled.
    #[error("Git task '{operation}' did not complete: {message}")]
    TaskFailed { operation: String, message: String },

    /// The signature verifier itself failed, as opposed to rejecting a signature.
    #[error("Unable to verify signature of commit {commit}: {message}")]
    Verification { commit: String, message: String },
}

impl Error {
    /// Wrap a `git2` error with the name of the operation that produced it.
    pub fn git(operation: impl Into<String>, err: git2::Error) -> Self {
        Self::GitOperation {
            operation: operation.into(),
            message: err.message().to_string(),
        }
    }
}
