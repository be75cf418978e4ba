//! Users and their access to a repository.

use async_trait::async_trait;
use protection_rules::UserId;
use serde::{Deserialize, Serialize};

use crate::{Rejection, RepositoryInfo, StoreError};

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

/// Level of access to a repository unit, ordered from least to most.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    #[default]
    None,
    Read,
    Write,
    Admin,
    Owner,
}

/// The parts of a repository access is granted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Code,
    PullRequests,
}

/// A user's effective permission on one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Site administrator; grants every access
    #[serde(default)]
    pub is_admin: bool,

    #[serde(default)]
    pub code: AccessMode,

    #[serde(default)]
    pub pull_requests: AccessMode,
}

impl Permission {
    pub fn access(&self, unit: Unit) -> AccessMode {
        if self.is_admin {
            return AccessMode::Owner;
        }
        match unit {
            Unit::Code => self.code,
            Unit::PullRequests => self.pull_requests,
        }
    }

    pub fn can_read(&self, unit: Unit) -> bool {
        self.access(unit) >= AccessMode::Read
    }

    pub fn can_write(&self, unit: Unit) -> bool {
        self.access(unit) >= AccessMode::Write
    }

    /// Site administrator or administrator of the repository.
    pub fn is_admin(&self) -> bool {
        self.is_admin || self.code >= AccessMode::Admin
    }
}

/// The pushing user and their permission, resolved once per push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user: User,
    pub permission: Permission,
}

impl ResolvedUser {
    pub fn assert_can_write_code(&self) -> Result<(), Rejection> {
        if self.permission.can_write(Unit::Code) {
            Ok(())
        } else {
            Err(Rejection::PermissionDenied)
        }
    }

    /// Opening a pull request needs read access to the pull request unit.
    pub fn assert_can_create_pull_request(&self) -> Result<(), Rejection> {
        if self.permission.can_read(Unit::PullRequests) {
            Ok(())
        } else {
            Err(Rejection::PermissionDenied)
        }
    }
}

/// Looks up users and their repository permissions.
#[async_trait]
pub trait PermissionResolver: Send + Sync {
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError>;

    async fn repository_permission(
        &self,
        repository: &RepositoryInfo,
        user: &User,
    ) -> Result<Permission, StoreError>;
}
