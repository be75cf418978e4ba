//! Tag protection evaluation.

use protection_rules::is_user_allowed_to_control_tag;
use tracing::debug;

use crate::decision::conclude;
use crate::{Decision, PolicyServices, PushContext, RefUpdate, Rejection};

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;

/// Evaluates updates of `refs/tags/*`.
///
/// Creating, moving and deleting a tag are treated alike: the user must be
/// allowed to control the tag.
pub struct TagProtectionEvaluator {
    services: PolicyServices,
}

impl TagProtectionEvaluator {
    pub fn new(services: PolicyServices) -> Self {
        Self { services }
    }

    pub async fn evaluate(&self, ctx: &mut PushContext, update: &RefUpdate, tag: &str) -> Decision {
        let result = self.check(ctx, tag).await;
        conclude(result, ctx, update)
    }

    async fn check(&self, ctx: &mut PushContext, tag: &str) -> Result<(), Rejection> {
        ctx.resolve_user(self.services.permissions.as_ref())
            .await?
            .assert_can_write_code()?;

        let user = ctx.options().user_id;
        let rules = ctx.protected_tags(self.services.rules.as_ref()).await?;
        let allowed =
            is_user_allowed_to_control_tag(rules, tag, user, self.services.teams.as_ref())
                .await
                .map_err(|e| Rejection::internal("Error checking tag protection", e))?;

        if !allowed {
            return Err(Rejection::ProtectedTag {
                tag: tag.to_string(),
            });
        }
        debug!(tag, user_id = %user, "Tag update allowed");
        Ok(())
    }
}
