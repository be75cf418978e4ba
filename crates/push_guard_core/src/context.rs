//! Per-push request data and memoized lookups.

use git_client::{CommitId, GitEnvironment};
use protection_rules::{ProtectionRuleStore, TagProtectionRule, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    PermissionResolver, PullRequestId, RefUpdate, Rejection, ResolvedUser, ValidationError,
};

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;

/// The push request as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookOptions {
    pub user_id: UserId,

    #[serde(default)]
    pub is_deploy_key: bool,

    /// Pull request being merged by this push; `0` when none
    #[serde(default)]
    pub pull_request_id: i64,

    #[serde(default)]
    pub is_wiki: bool,

    /// Updates in the order they are evaluated
    #[serde(default)]
    pub ref_updates: Vec<RefUpdate>,

    #[serde(default)]
    pub git_alternative_object_directories: Option<String>,

    #[serde(default)]
    pub git_object_directory: Option<String>,

    #[serde(default)]
    pub git_quarantine_path: Option<String>,
}

impl HookOptions {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Build the updates from the parallel old id, new id and ref name lists.
    pub fn from_parallel_lists<S: AsRef<str>>(
        user_id: UserId,
        old_commit_ids: &[S],
        new_commit_ids: &[S],
        ref_full_names: &[S],
    ) -> Result<Self, ValidationError> {
        if old_commit_ids.len() != new_commit_ids.len()
            || old_commit_ids.len() != ref_full_names.len()
        {
            return Err(ValidationError::MismatchedLists {
                old: old_commit_ids.len(),
                new: new_commit_ids.len(),
                refs: ref_full_names.len(),
            });
        }

        let ref_updates = old_commit_ids
            .iter()
            .zip(new_commit_ids)
            .zip(ref_full_names)
            .map(|((old, new), name)| -> Result<RefUpdate, ValidationError> {
                Ok(RefUpdate::new(
                    CommitId::new(old.as_ref())?,
                    CommitId::new(new.as_ref())?,
                    name.as_ref(),
                ))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ref_updates,
            ..Self::new(user_id)
        })
    }

    pub fn pull_request_id(&self) -> Option<PullRequestId> {
        (self.pull_request_id > 0).then(|| PullRequestId::new(self.pull_request_id))
    }

    /// The git environment described by the object directory hints.
    pub fn git_environment(&self) -> GitEnvironment {
        GitEnvironment::from_hints(
            self.git_alternative_object_directories.as_deref(),
            self.git_object_directory.as_deref(),
            self.git_quarantine_path.as_deref(),
        )
    }
}

/// The repository receiving the push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub owner: String,
    pub name: String,
    pub default_branch: String,

    /// The repository has no commits yet
    #[serde(default)]
    pub is_empty: bool,
}

impl RepositoryInfo {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        default_branch: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            default_branch: default_branch.into(),
            is_empty: false,
        }
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// State shared by every ref update of one push.
///
/// The pushing user and their permission are resolved at most once, as is the
/// protected tag list. A failed lookup is not cached.
#[derive(Debug)]
pub struct PushContext {
    options: HookOptions,
    repository: RepositoryInfo,
    env: GitEnvironment,
    user: Option<ResolvedUser>,
    protected_tags: Option<Vec<TagProtectionRule>>,
}

impl PushContext {
    pub fn new(repository: RepositoryInfo, options: HookOptions) -> Self {
        let env = options.git_environment();
        Self {
            options,
            repository,
            env,
            user: None,
            protected_tags: None,
        }
    }

    pub fn options(&self) -> &HookOptions {
        &self.options
    }

    pub fn repository(&self) -> &RepositoryInfo {
        &self.repository
    }

    pub fn env(&self) -> &GitEnvironment {
        &self.env
    }

    /// The pushing user and their permission on the repository.
    pub async fn resolve_user(
        &mut self,
        resolver: &dyn PermissionResolver,
    ) -> Result<&ResolvedUser, Rejection> {
        let resolved = match self.user.take() {
            Some(resolved) => resolved,
            None => {
                let user_id = self.options.user_id;
                let user = resolver.user_by_id(user_id).await.map_err(|e| {
                    Rejection::internal(format!("Unable to get User id {user_id}"), e)
                })?;
                let permission = resolver
                    .repository_permission(&self.repository, &user)
                    .await
                    .map_err(|e| {
                        Rejection::internal(
                            format!(
                                "Unable to get Repo permission of repo {} for user {}",
                                self.repository.full_name(),
                                user.name
                            ),
                            e,
                        )
                    })?;
                debug!(
                    user_id = %user_id,
                    user_name = %user.name,
                    repository = %self.repository.full_name(),
                    "Resolved pushing user"
                );
                ResolvedUser { user, permission }
            }
        };
        Ok(self.user.insert(resolved))
    }

    /// The protection rules of every tag in the repository.
    pub async fn protected_tags(
        &mut self,
        store: &dyn ProtectionRuleStore,
    ) -> Result<&[TagProtectionRule], Rejection> {
        let rules = match self.protected_tags.take() {
            Some(rules) => rules,
            None => {
                let repository = self.repository.full_name();
                let rules = store
                    .tag_rules(&repository)
                    .await
                    .map_err(|e| Rejection::internal("Unable to get protected tags", e))?;
                debug!(repository = %repository, count = rules.len(), "Loaded protected tags");
                rules
            }
        };
        Ok(self.protected_tags.insert(rules))
    }
}
