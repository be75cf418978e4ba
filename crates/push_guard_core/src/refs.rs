//! Ref updates and their classification.

use git_client::CommitId;
use serde::{Deserialize, Serialize};

use crate::ValidationError;

#[cfg(test)]
#[path = "refs_tests.rs"]
mod tests;

pub const BRANCH_PREFIX: &str = "refs/heads/";
pub const TAG_PREFIX: &str = "refs/tags/";
pub const PULL_REQUEST_PREFIX: &str = "refs/for/";

/// What a ref name points at, with the prefix stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind<'a> {
    Branch(&'a str),
    Tag(&'a str),
    /// `refs/for/<base>`: a request to open a pull request against `base`
    PullRequestHead(&'a str),
    Other,
}

/// One proposed change of a ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    pub old_commit_id: CommitId,
    pub new_commit_id: CommitId,
    pub ref_full_name: String,
}

impl RefUpdate {
    pub fn new(old: CommitId, new: CommitId, ref_full_name: impl Into<String>) -> Self {
        Self {
            old_commit_id: old,
            new_commit_id: new,
            ref_full_name: ref_full_name.into(),
        }
    }

    /// Parse a line of git's pre-receive protocol: `<old> <new> <ref>`.
    pub fn parse_line(line: &str) -> Result<Self, ValidationError> {
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next(), fields.next(), fields.next()) {
            (Some(old), Some(new), Some(name), None) => {
                Ok(Self::new(CommitId::new(old)?, CommitId::new(new)?, name))
            }
            _ => Err(ValidationError::MalformedLine(line.to_string())),
        }
    }

    /// The ref did not exist before the push.
    pub fn is_creation(&self) -> bool {
        self.old_commit_id.is_empty()
    }

    /// The push removes the ref.
    pub fn is_deletion(&self) -> bool {
        self.new_commit_id.is_empty()
    }

    pub fn kind(&self) -> RefKind<'_> {
        let name = self.ref_full_name.as_str();
        if let Some(branch) = name.strip_prefix(BRANCH_PREFIX) {
            RefKind::Branch(branch)
        } else if let Some(tag) = name.strip_prefix(TAG_PREFIX) {
            RefKind::Tag(tag)
        } else if let Some(base) = name.strip_prefix(PULL_REQUEST_PREFIX) {
            RefKind::PullRequestHead(base)
        } else {
            RefKind::Other
        }
    }
}
