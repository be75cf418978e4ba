//! Push acceptance policy engine.
//!
//! Before the refs of a repository are updated by an incoming push, every
//! updated ref is checked against the protection rules of the repository:
//!
//! - `refs/heads/*` by [`BranchProtectionEvaluator`]
//! - `refs/tags/*` by [`TagProtectionEvaluator`]
//! - `refs/for/*` by [`PullRequestHeadValidator`], when AGit flow is enabled
//! - anything else only requires write access to the code
//!
//! [`RefUpdateDispatcher`] walks the updates in request order and stops at
//! the first that is not allowed. The engine talks to the outside world only
//! through the traits bundled in [`PolicyServices`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use push_guard_core::{
//!     EngineSettings, HookOptions, PolicyServices, PushContext, RefUpdateDispatcher,
//!     RepositoryInfo,
//! };
//!
//! # async fn example(services: PolicyServices, options: HookOptions) {
//! let dispatcher = RefUpdateDispatcher::new(services, EngineSettings::default());
//! let mut ctx = PushContext::new(RepositoryInfo::new("acme", "app", "main"), options);
//!
//! let decision = dispatcher.run(&mut ctx).await;
//! println!("{}: {:?}", decision.status(), decision.reason());
//! # }
//! ```

pub mod errors;
pub use errors::{Rejection, StoreError, ValidationError};

mod refs;
pub use refs::{RefKind, RefUpdate, BRANCH_PREFIX, PULL_REQUEST_PREFIX, TAG_PREFIX};

mod decision;
pub use decision::{Decision, HookResponse, Severity};

mod permission;
pub use permission::{AccessMode, Permission, PermissionResolver, ResolvedUser, Unit, User};

mod pull_request;
pub use pull_request::{MergeReadiness, PullRequest, PullRequestId, PullRequestStore};

mod context;
pub use context::{HookOptions, PushContext, RepositoryInfo};

mod services;
pub use services::PolicyServices;

mod branch;
pub use branch::BranchProtectionEvaluator;

mod tag;
pub use tag::TagProtectionEvaluator;

mod pull_request_head;
pub use pull_request_head::PullRequestHeadValidator;

mod dispatcher;
pub use dispatcher::{EngineSettings, RefUpdateDispatcher};

#[cfg(test)]
mod test_support;
