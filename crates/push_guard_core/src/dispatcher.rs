//! Routing of every ref update of a push to its evaluator.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::decision::conclude;
use crate::{
    BranchProtectionEvaluator, Decision, PolicyServices, PullRequestHeadValidator, PushContext,
    RefKind, RefUpdate, Rejection, TagProtectionEvaluator,
};

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;

/// Server features that change how refs are routed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// `refs/for/*` pushes open pull requests (AGit flow)
    #[serde(default)]
    pub support_proc_receive: bool,
}

/// Evaluates the ref updates of a push in request order.
///
/// The first update that is not allowed decides the push; later updates are
/// not evaluated.
pub struct RefUpdateDispatcher {
    services: PolicyServices,
    settings: EngineSettings,
    branches: BranchProtectionEvaluator,
    tags: TagProtectionEvaluator,
    pull_request_heads: PullRequestHeadValidator,
}

impl RefUpdateDispatcher {
    pub fn new(services: PolicyServices, settings: EngineSettings) -> Self {
        Self {
            branches: BranchProtectionEvaluator::new(services.clone()),
            tags: TagProtectionEvaluator::new(services.clone()),
            pull_request_heads: PullRequestHeadValidator::new(services.clone()),
            services,
            settings,
        }
    }

    #[instrument(
        skip_all,
        fields(
            repository = %ctx.repository().full_name(),
            user_id = %ctx.options().user_id,
            updates = ctx.options().ref_updates.len(),
        )
    )]
    pub async fn run(&self, ctx: &mut PushContext) -> Decision {
        let updates = ctx.options().ref_updates.clone();
        for update in &updates {
            let decision = self.dispatch(ctx, update).await;
            if !decision.is_allow() {
                return decision;
            }
        }
        info!(updates = updates.len(), "Push accepted");
        Decision::Allow
    }

    async fn dispatch(&self, ctx: &mut PushContext, update: &RefUpdate) -> Decision {
        match update.kind() {
            RefKind::Branch(branch) => self.branches.evaluate(ctx, update, branch).await,
            RefKind::Tag(tag) => self.tags.evaluate(ctx, update, tag).await,
            RefKind::PullRequestHead(base) if self.settings.support_proc_receive => {
                self.pull_request_heads.evaluate(ctx, update, base).await
            }
            _ => {
                let result = self.check_write_code(ctx).await;
                conclude(result, ctx, update)
            }
        }
    }

    async fn check_write_code(&self, ctx: &mut PushContext) -> Result<(), Rejection> {
        ctx.resolve_user(self.services.permissions.as_ref())
            .await?
            .assert_can_write_code()
    }
}
