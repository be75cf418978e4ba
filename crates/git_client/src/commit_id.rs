//! Commit identifier type.

use serde::{Deserialize, Serialize};

use crate::Error;

#[cfg(test)]
#[path = "commit_id_tests.rs"]
mod tests;

/// The all-zero SHA-1 id git uses for "this ref does not exist".
pub const EMPTY_SHA: &str = "0000000000000000000000000000000000000000";

/// Validated hexadecimal commit id.
///
/// Accepts SHA-1 (40 characters) and SHA-256 (64 characters) ids and stores
/// them lowercased. An id made only of zeros is the *empty* id: in a ref
/// update it marks a ref that did not exist before (creation) or will not
/// exist afterwards (deletion).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommitId(String);

impl CommitId {
    /// Create a commit id with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidCommitId` if the value is not 40 or 64 hex digits.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        let trimmed = id.trim();

        if !matches!(trimmed.len(), 40 | 64) || !trimmed.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidCommitId(id));
        }

        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// The empty (all-zero) SHA-1 id.
    pub fn empty() -> Self {
        Self(EMPTY_SHA.to_string())
    }

    /// Whether this is the empty id.
    pub fn is_empty(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn to_oid(&self) -> Result<git2::Oid, Error> {
        git2::Oid::from_str(&self.0).map_err(|_| Error::InvalidCommitId(self.0.clone()))
    }
}

impl std::fmt::Display for CommitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommitId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CommitId> for String {
    fn from(id: CommitId) -> Self {
        id.0
    }
}

impl From<git2::Oid> for CommitId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}
