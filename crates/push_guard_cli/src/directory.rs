//! Users, teams and pull requests served from the configuration file.

use std::collections::HashMap;

use async_trait::async_trait;
use protection_rules::{RuleError, TeamId, TeamMembership, UserId};
use push_guard_core::{
    MergeReadiness, Permission, PermissionResolver, PullRequest, PullRequestId,
    PullRequestStore, RepositoryInfo, StoreError, User,
};
use tracing::debug;

use crate::config::{AppConfig, PullRequestConfig, UserConfig};

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;

const DEFAULT_NOT_READY_REASON: &str = "merge requirements are not met";

/// Read-only directory built from [`AppConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigDirectory {
    users: HashMap<UserId, UserConfig>,
    teams: HashMap<TeamId, Vec<UserId>>,
    pull_requests: HashMap<PullRequestId, PullRequestConfig>,
}

impl ConfigDirectory {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            users: config.users.iter().map(|u| (u.id, u.clone())).collect(),
            teams: config
                .teams
                .iter()
                .map(|t| (t.id, t.members.clone()))
                .collect(),
            pull_requests: config
                .pull_requests
                .iter()
                .map(|p| (p.id, p.clone()))
                .collect(),
        }
    }

    fn pull_request_config(&self, id: PullRequestId) -> Result<&PullRequestConfig, StoreError> {
        self.pull_requests.get(&id).ok_or(StoreError::NotFound {
            entity: "pull request",
            id: id.value(),
        })
    }
}

#[async_trait]
impl PermissionResolver for ConfigDirectory {
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .get(&id)
            .map(|u| User {
                id: u.id,
                name: u.name.clone(),
            })
            .ok_or(StoreError::NotFound {
                entity: "user",
                id: id.value(),
            })
    }

    /// Every configured user has the same permission on the one repository.
    async fn repository_permission(
        &self,
        repository: &RepositoryInfo,
        user: &User,
    ) -> Result<Permission, StoreError> {
        let config = self.users.get(&user.id).ok_or(StoreError::NotFound {
            entity: "user",
            id: user.id.value(),
        })?;
        debug!(
            repository = %repository.full_name(),
            user = %user.name,
            code = ?config.code,
            "Resolved repository permission"
        );
        Ok(Permission {
            is_admin: config.admin,
            code: config.code,
            pull_requests: config.pull_requests,
        })
    }
}

#[async_trait]
impl TeamMembership for ConfigDirectory {
    async fn is_user_in_teams(&self, user: UserId, teams: &[TeamId]) -> Result<bool, RuleError> {
        Ok(teams.iter().any(|team| {
            self.teams
                .get(team)
                .is_some_and(|members| members.contains(&user))
        }))
    }
}

#[async_trait]
impl PullRequestStore for ConfigDirectory {
    async fn pull_request_by_id(&self, id: PullRequestId) -> Result<PullRequest, StoreError> {
        let config = self.pull_request_config(id)?;
        Ok(PullRequest {
            id: config.id,
            index: config.index,
            base_branch: config.base_branch.clone(),
            head_repo: config.head_repo.clone(),
        })
    }

    /// Administrators and the listed mergers may merge.
    async fn is_user_allowed_to_merge(
        &self,
        pull_request: &PullRequest,
        permission: &Permission,
        user: &User,
    ) -> Result<bool, StoreError> {
        let config = self.pull_request_config(pull_request.id)?;
        Ok(permission.is_admin() || config.mergers.contains(&user.id))
    }

    async fn check_ready_to_merge(
        &self,
        pull_request: &PullRequest,
    ) -> Result<MergeReadiness, StoreError> {
        let config = self.pull_request_config(pull_request.id)?;
        if config.ready {
            return Ok(MergeReadiness::Ready);
        }
        Ok(MergeReadiness::NotReady(
            config
                .not_ready_reason
                .clone()
                .unwrap_or_else(|| DEFAULT_NOT_READY_REASON.to_string()),
        ))
    }
}
