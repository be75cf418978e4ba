//! Mock collaborators shared by the engine tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use git_client::{
    CommitId, FilePatterns, GitEnvironment, GitPlumbingClient, VerificationOutcome,
};
use protection_rules::{
    BranchProtectionRule, ProtectionRuleStore, RuleError, RuleSet, TagProtectionRule, TeamId,
    TeamMembership, UserId,
};

use crate::{
    AccessMode, HookOptions, MergeReadiness, Permission, PermissionResolver, PolicyServices,
    PullRequest, PullRequestId, PullRequestStore, PushContext, RefUpdate, RepositoryInfo,
    StoreError, User,
};

fn simulated(operation: &str) -> git_client::Error {
    git_client::Error::GitOperation {
        operation: operation.to_string(),
        message: "simulated failure".to_string(),
    }
}

/// Plumbing client answering from fixed values and recording each call.
#[derive(Default)]
pub struct MockGit {
    pub force_push: bool,
    pub fail_ancestry: bool,
    pub changed_files: Vec<String>,
    pub fail_diff: bool,
    pub verification: Option<VerificationOutcome>,
    pub fail_verification: bool,
    pub branches: Vec<String>,
    pub fail_branch_lookup: bool,
    pub calls: Mutex<Vec<String>>,
}

impl MockGit {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl GitPlumbingClient for MockGit {
    async fn is_ancestor(
        &self,
        _env: &GitEnvironment,
        _ancestor: &CommitId,
        _descendant: &CommitId,
    ) -> Result<bool, git_client::Error> {
        self.record("is_ancestor".to_string());
        if self.fail_ancestry {
            return Err(simulated("merge-base"));
        }
        Ok(!self.force_push)
    }

    async fn matched_files(
        &self,
        _env: &GitEnvironment,
        _old: &CommitId,
        _new: &CommitId,
        patterns: &FilePatterns,
        limit: usize,
    ) -> Result<Vec<String>, git_client::Error> {
        self.record("matched_files".to_string());
        if self.fail_diff {
            return Err(simulated("diff"));
        }
        let matched = self
            .changed_files
            .iter()
            .filter(|path| patterns.matches(path))
            .cloned();
        Ok(if limit == 0 {
            matched.collect()
        } else {
            matched.take(limit).collect()
        })
    }

    async fn only_matching_files(
        &self,
        _env: &GitEnvironment,
        _old: &CommitId,
        _new: &CommitId,
        patterns: &FilePatterns,
    ) -> Result<bool, git_client::Error> {
        self.record("only_matching_files".to_string());
        if self.fail_diff {
            return Err(simulated("diff"));
        }
        Ok(self.changed_files.iter().all(|path| patterns.matches(path)))
    }

    async fn verify_commits(
        &self,
        _env: &GitEnvironment,
        _old: &CommitId,
        _new: &CommitId,
    ) -> Result<VerificationOutcome, git_client::Error> {
        self.record("verify_commits".to_string());
        if self.fail_verification {
            return Err(simulated("rev-list"));
        }
        Ok(self
            .verification
            .clone()
            .unwrap_or(VerificationOutcome::Verified))
    }

    async fn branch_exists(
        &self,
        _env: &GitEnvironment,
        name: &str,
    ) -> Result<bool, git_client::Error> {
        self.record(format!("branch_exists {name}"));
        if self.fail_branch_lookup {
            return Err(simulated("show-ref"));
        }
        Ok(self.branches.iter().any(|branch| branch == name))
    }

    async fn is_empty(&self, _env: &GitEnvironment) -> Result<bool, git_client::Error> {
        self.record("is_empty".to_string());
        Ok(false)
    }
}

/// Rule store over one rule set, counting tag rule loads.
#[derive(Default)]
pub struct MockRules {
    pub rules: RuleSet,
    pub fail: bool,
    pub tag_loads: AtomicUsize,
}

impl MockRules {
    pub fn branches(rules: Vec<BranchProtectionRule>) -> Self {
        Self {
            rules: RuleSet {
                branches: rules,
                tags: vec![],
            },
            ..Default::default()
        }
    }

    pub fn tags(rules: Vec<TagProtectionRule>) -> Self {
        Self {
            rules: RuleSet {
                branches: vec![],
                tags: rules,
            },
            ..Default::default()
        }
    }

    pub fn tag_loads(&self) -> usize {
        self.tag_loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProtectionRuleStore for MockRules {
    async fn branch_rule(
        &self,
        _repository: &str,
        branch: &str,
    ) -> Result<Option<BranchProtectionRule>, RuleError> {
        if self.fail {
            return Err(RuleError::Store("rule store offline".to_string()));
        }
        Ok(self.rules.branch_rule(branch).cloned())
    }

    async fn tag_rules(&self, _repository: &str) -> Result<Vec<TagProtectionRule>, RuleError> {
        self.tag_loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RuleError::Store("rule store offline".to_string()));
        }
        Ok(self.rules.tags.clone())
    }
}

#[derive(Default)]
pub struct MockTeams {
    pub members: Vec<(TeamId, UserId)>,
    pub fail: bool,
}

#[async_trait]
impl TeamMembership for MockTeams {
    async fn is_user_in_teams(&self, user: UserId, teams: &[TeamId]) -> Result<bool, RuleError> {
        if self.fail {
            return Err(RuleError::TeamLookup("team store offline".to_string()));
        }
        Ok(self
            .members
            .iter()
            .any(|(team, member)| *member == user && teams.contains(team)))
    }
}

/// Every user gets the same permission; resolutions are counted.
pub struct MockPermissions {
    pub permission: Permission,
    pub fail: bool,
    pub resolutions: AtomicUsize,
}

impl MockPermissions {
    pub fn with(permission: Permission) -> Self {
        Self {
            permission,
            fail: false,
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl Default for MockPermissions {
    fn default() -> Self {
        Self::with(writer())
    }
}

#[async_trait]
impl PermissionResolver for MockPermissions {
    async fn user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(StoreError::NotFound {
                entity: "user",
                id: id.value(),
            });
        }
        Ok(User {
            id,
            name: format!("user{id}"),
        })
    }

    async fn repository_permission(
        &self,
        _repository: &RepositoryInfo,
        _user: &User,
    ) -> Result<Permission, StoreError> {
        Ok(self.permission.clone())
    }
}

/// A single pull request with configurable merge checks.
pub struct MockPullRequests {
    pub pull_request: Option<PullRequest>,
    pub allowed_to_merge: bool,
    pub fail_merge_check: bool,
    pub readiness: MergeReadiness,
    pub fail_readiness: bool,
}

impl Default for MockPullRequests {
    fn default() -> Self {
        Self {
            pull_request: Some(PullRequest {
                id: PullRequestId::new(12),
                index: 3,
                base_branch: "main".to_string(),
                head_repo: "acme/app".to_string(),
            }),
            allowed_to_merge: true,
            fail_merge_check: false,
            readiness: MergeReadiness::Ready,
            fail_readiness: false,
        }
    }
}

#[async_trait]
impl PullRequestStore for MockPullRequests {
    async fn pull_request_by_id(&self, id: PullRequestId) -> Result<PullRequest, StoreError> {
        self.pull_request
            .clone()
            .filter(|pr| pr.id == id)
            .ok_or(StoreError::NotFound {
                entity: "pull request",
                id: id.value(),
            })
    }

    async fn is_user_allowed_to_merge(
        &self,
        _pull_request: &PullRequest,
        _permission: &Permission,
        _user: &User,
    ) -> Result<bool, StoreError> {
        if self.fail_merge_check {
            return Err(StoreError::Unavailable("merge check offline".to_string()));
        }
        Ok(self.allowed_to_merge)
    }

    async fn check_ready_to_merge(
        &self,
        _pull_request: &PullRequest,
    ) -> Result<MergeReadiness, StoreError> {
        if self.fail_readiness {
            return Err(StoreError::Unavailable("status checks offline".to_string()));
        }
        Ok(self.readiness.clone())
    }
}

/// Mocks wired into [`PolicyServices`], kept reachable for assertions.
#[derive(Default)]
pub struct Harness {
    pub git: Arc<MockGit>,
    pub rules: Arc<MockRules>,
    pub teams: Arc<MockTeams>,
    pub permissions: Arc<MockPermissions>,
    pub pull_requests: Arc<MockPullRequests>,
}

impl Harness {
    pub fn with_git(mut self, git: MockGit) -> Self {
        self.git = Arc::new(git);
        self
    }

    pub fn with_rules(mut self, rules: MockRules) -> Self {
        self.rules = Arc::new(rules);
        self
    }

    pub fn with_teams(mut self, teams: MockTeams) -> Self {
        self.teams = Arc::new(teams);
        self
    }

    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permissions = Arc::new(MockPermissions::with(permission));
        self
    }

    pub fn with_permissions(mut self, permissions: MockPermissions) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub fn with_pull_requests(mut self, pull_requests: MockPullRequests) -> Self {
        self.pull_requests = Arc::new(pull_requests);
        self
    }

    pub fn services(&self) -> PolicyServices {
        PolicyServices::new(
            self.git.clone(),
            self.rules.clone(),
            self.teams.clone(),
            self.permissions.clone(),
            self.pull_requests.clone(),
        )
    }
}

pub fn sha(c: char) -> CommitId {
    CommitId::new(c.to_string().repeat(40)).unwrap()
}

pub fn update(old: CommitId, new: CommitId, name: &str) -> RefUpdate {
    RefUpdate::new(old, new, name)
}

/// A push by user 1 to `acme/app`, whose default branch is `main`.
pub fn context(updates: Vec<RefUpdate>) -> PushContext {
    let mut options = HookOptions::new(UserId::new(1));
    options.ref_updates = updates;
    PushContext::new(RepositoryInfo::new("acme", "app", "main"), options)
}

pub fn context_with(options: HookOptions) -> PushContext {
    PushContext::new(RepositoryInfo::new("acme", "app", "main"), options)
}

pub fn writer() -> Permission {
    Permission {
        is_admin: false,
        code: AccessMode::Write,
        pull_requests: AccessMode::Write,
    }
}

pub fn reader() -> Permission {
    Permission {
        is_admin: false,
        code: AccessMode::Read,
        pull_requests: AccessMode::Read,
    }
}

pub fn admin() -> Permission {
    Permission {
        is_admin: false,
        code: AccessMode::Admin,
        pull_requests: AccessMode::Admin,
    }
}
