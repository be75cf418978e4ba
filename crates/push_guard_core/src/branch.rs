//! Branch protection evaluation.
//!
//! A branch update passes through a fixed sequence of guards: permission,
//! default-branch deletion, rule lookup, deletion, force push, signed commits,
//! protected files, and finally either the direct-push whitelist or the merge
//! checks of the pull request being merged. The first guard that refuses
//! decides the outcome.

use git_client::{GitEnvironment, VerificationOutcome};
use protection_rules::BranchProtectionRule;
use tracing::debug;

use crate::decision::conclude;
use crate::{
    Decision, MergeReadiness, PolicyServices, PullRequestId, PushContext, RefUpdate, Rejection,
    ResolvedUser, Unit,
};

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;

/// Evaluates updates of `refs/heads/*`.
pub struct BranchProtectionEvaluator {
    services: PolicyServices,
}

impl BranchProtectionEvaluator {
    pub fn new(services: PolicyServices) -> Self {
        Self { services }
    }

    /// Decide whether `update` of `branch` may be applied.
    pub async fn evaluate(
        &self,
        ctx: &mut PushContext,
        update: &RefUpdate,
        branch: &str,
    ) -> Decision {
        let result = self.check(ctx, update, branch).await;
        conclude(result, ctx, update)
    }

    async fn check(
        &self,
        ctx: &mut PushContext,
        update: &RefUpdate,
        branch: &str,
    ) -> Result<(), Rejection> {
        let resolved = ctx
            .resolve_user(self.services.permissions.as_ref())
            .await?
            .clone();
        resolved.assert_can_write_code()?;

        let ctx: &PushContext = ctx;
        let repository = ctx.repository();
        let env = ctx.env();
        let old = &update.old_commit_id;
        let new = &update.new_commit_id;

        if branch == repository.default_branch && update.is_deletion() {
            return Err(Rejection::DefaultBranchDeletion {
                branch: branch.to_string(),
            });
        }

        let rule = self
            .services
            .rules
            .branch_rule(&repository.full_name(), branch)
            .await
            .map_err(|e| Rejection::internal(format!("Unable to get protected branch {branch}"), e))?;
        let rule = match rule {
            Some(rule) if rule.is_protected() => rule,
            _ => {
                debug!(branch, "Branch is not protected");
                return Ok(());
            }
        };

        if update.is_deletion() {
            return Err(Rejection::ProtectedFromDeletion {
                branch: branch.to_string(),
            });
        }

        if !update.is_creation() {
            let fast_forward = self
                .services
                .git
                .is_ancestor(env, old, new)
                .await
                .map_err(|e| Rejection::internal("Fail to detect force push", e))?;
            if !fast_forward {
                return Err(Rejection::ForcePush {
                    branch: branch.to_string(),
                });
            }
        }

        if rule.require_signed_commits {
            let outcome = self
                .services
                .git
                .verify_commits(env, old, new)
                .await
                .map_err(|e| {
                    Rejection::internal(format!("Unable to check commits from {old} to {new}"), e)
                })?;
            if let VerificationOutcome::Unverified(commit) = outcome {
                return Err(Rejection::UnverifiedCommit {
                    branch: branch.to_string(),
                    commit,
                });
            }
        }

        let protected_file = self.first_protected_file(env, update, &rule).await?;
        let changed_protected_files = protected_file.is_some();

        let can_push = if ctx.options().is_deploy_key {
            !changed_protected_files
                && rule.can_push
                && (!rule.enable_whitelist || rule.whitelist_deploy_keys)
        } else {
            !changed_protected_files
                && rule
                    .can_user_push(
                        resolved.user.id,
                        resolved.permission.can_write(Unit::Code),
                        self.services.teams.as_ref(),
                    )
                    .await
        };
        if can_push {
            debug!(branch, "Direct push allowed by branch rule");
            return Ok(());
        }

        match ctx.options().pull_request_id() {
            None => {
                self.check_direct_push(env, update, branch, &rule, protected_file)
                    .await
            }
            Some(id) => self.check_merge(id, branch, &resolved, protected_file).await,
        }
    }

    /// The first changed file matching the protected patterns of the rule.
    async fn first_protected_file(
        &self,
        env: &GitEnvironment,
        update: &RefUpdate,
        rule: &BranchProtectionRule,
    ) -> Result<Option<String>, Rejection> {
        let patterns = rule.protected_file_patterns();
        if patterns.is_empty() {
            return Ok(None);
        }
        let old = &update.old_commit_id;
        let new = &update.new_commit_id;
        let matched = self
            .services
            .git
            .matched_files(env, old, new, &patterns, 1)
            .await
            .map_err(|e| {
                Rejection::internal(
                    format!("Unable to check file protection for commits from {old} to {new}"),
                    e,
                )
            })?;
        Ok(matched.into_iter().next())
    }

    /// A push that is not merging a pull request and not whitelisted.
    async fn check_direct_push(
        &self,
        env: &GitEnvironment,
        update: &RefUpdate,
        branch: &str,
        rule: &BranchProtectionRule,
        protected_file: Option<String>,
    ) -> Result<(), Rejection> {
        if let Some(path) = protected_file {
            return Err(Rejection::ProtectedFile {
                branch: branch.to_string(),
                path,
            });
        }

        let patterns = rule.unprotected_file_patterns();
        if !patterns.is_empty() {
            let old = &update.old_commit_id;
            let new = &update.new_commit_id;
            let only_unprotected = self
                .services
                .git
                .only_matching_files(env, old, new, &patterns)
                .await
                .map_err(|e| {
                    Rejection::internal(
                        format!("Unable to check file protection for commits from {old} to {new}"),
                        e,
                    )
                })?;
            if only_unprotected {
                debug!(branch, "Only unprotected files changed");
                return Ok(());
            }
        }

        Err(Rejection::NotAllowedToPush {
            branch: branch.to_string(),
        })
    }

    /// A push merging pull request `id` into the branch.
    async fn check_merge(
        &self,
        id: PullRequestId,
        branch: &str,
        resolved: &ResolvedUser,
        protected_file: Option<String>,
    ) -> Result<(), Rejection> {
        let store = self.services.pull_requests.as_ref();
        let pull_request = store
            .pull_request_by_id(id)
            .await
            .map_err(|e| Rejection::internal(format!("Unable to get PullRequest {id}"), e))?;

        let allowed = store
            .is_user_allowed_to_merge(&pull_request, &resolved.permission, &resolved.user)
            .await
            .map_err(|e| Rejection::internal("Error calculating if allowed to merge", e))?;
        if !allowed {
            debug!(
                branch,
                pull_request = pull_request.index,
                "User is not allowed to merge"
            );
            return Err(Rejection::NotAllowedToPush {
                branch: branch.to_string(),
            });
        }

        if resolved.permission.is_admin() {
            debug!(branch, pull_request = pull_request.index, "Admin merge allowed");
            return Ok(());
        }

        if let Some(path) = protected_file {
            return Err(Rejection::ProtectedFile {
                branch: branch.to_string(),
                path,
            });
        }

        let readiness = store.check_ready_to_merge(&pull_request).await.map_err(|e| {
            Rejection::internal(format!("Unable to get status of pull request {id}"), e)
        })?;
        match readiness {
            MergeReadiness::Ready => Ok(()),
            MergeReadiness::NotReady(reason) => Err(Rejection::PullRequestNotReady {
                branch: branch.to_string(),
                index: pull_request.index,
                reason,
            }),
        }
    }
}
