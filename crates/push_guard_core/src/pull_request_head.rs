//! Validation of `refs/for/<base>` pushes that open pull requests.

use git_client::GitEnvironment;
use tracing::debug;

use crate::decision::conclude;
use crate::{Decision, PolicyServices, PushContext, RefUpdate, Rejection};

#[cfg(test)]
#[path = "pull_request_head_tests.rs"]
mod tests;

/// Checks a push that asks to open a pull request against `base`.
pub struct PullRequestHeadValidator {
    services: PolicyServices,
}

impl PullRequestHeadValidator {
    pub fn new(services: PolicyServices) -> Self {
        Self { services }
    }

    pub async fn evaluate(&self, ctx: &mut PushContext, update: &RefUpdate, base: &str) -> Decision {
        let result = self.check(ctx, update, base).await;
        conclude(result, ctx, update)
    }

    async fn check(
        &self,
        ctx: &mut PushContext,
        update: &RefUpdate,
        base: &str,
    ) -> Result<(), Rejection> {
        ctx.resolve_user(self.services.permissions.as_ref())
            .await?
            .assert_can_create_pull_request()?;

        if ctx.repository().is_empty {
            return Err(Rejection::EmptyRepository);
        }
        if ctx.options().is_wiki {
            return Err(Rejection::WikiPullRequest);
        }

        let exists = self
            .base_branch_exists(ctx.env(), base)
            .await
            .map_err(|e| Rejection::internal(format!("Unable to check branch {base}"), e))?;
        if !exists {
            return Err(Rejection::UnexpectedRef {
                ref_name: update.ref_full_name.clone(),
            });
        }
        debug!(base, "Pull request base branch exists");
        Ok(())
    }

    /// `base` may carry a topic suffix: `main/topic` targets `main`.
    ///
    /// A prefix ending at a `/` counts unless that `/` is the last character.
    async fn base_branch_exists(
        &self,
        env: &GitEnvironment,
        base: &str,
    ) -> Result<bool, git_client::Error> {
        let git = self.services.git.as_ref();
        if git.branch_exists(env, base).await? {
            return Ok(true);
        }
        for (position, c) in base.char_indices() {
            if c == '/'
                && position != base.len() - 1
                && git.branch_exists(env, &base[..position]).await?
            {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
