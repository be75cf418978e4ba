//! The collaborators a push is evaluated against.

use std::sync::Arc;

use git_client::GitPlumbingClient;
use protection_rules::{ProtectionRuleStore, TeamMembership};

use crate::{PermissionResolver, PullRequestStore};

/// Shared handles to every external collaborator of the engine.
#[derive(Clone)]
pub struct PolicyServices {
    pub git: Arc<dyn GitPlumbingClient>,
    pub rules: Arc<dyn ProtectionRuleStore>,
    pub teams: Arc<dyn TeamMembership>,
    pub permissions: Arc<dyn PermissionResolver>,
    pub pull_requests: Arc<dyn PullRequestStore>,
}

impl PolicyServices {
    pub fn new(
        git: Arc<dyn GitPlumbingClient>,
        rules: Arc<dyn ProtectionRuleStore>,
        teams: Arc<dyn TeamMembership>,
        permissions: Arc<dyn PermissionResolver>,
        pull_requests: Arc<dyn PullRequestStore>,
    ) -> Self {
        Self {
            git,
            rules,
            teams,
            permissions,
            pull_requests,
        }
    }
}
