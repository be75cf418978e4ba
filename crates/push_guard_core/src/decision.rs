//! The outcome of evaluating a push.

use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{PushContext, Rejection, RefUpdate};

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;

/// How a denial is reported to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// A policy forbids the update (HTTP 403)
    Forbidden,
    /// The update could not be evaluated (HTTP 500)
    InternalError,
}

impl Severity {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Verdict on a ref update, or on a whole push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String, severity: Severity },
}

impl Decision {
    pub fn deny(reason: impl Into<String>, severity: Severity) -> Self {
        Self::Deny {
            reason: reason.into(),
            severity,
        }
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Allow => None,
            Self::Deny { reason, .. } => Some(reason),
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match self {
            Self::Allow => None,
            Self::Deny { severity, .. } => Some(*severity),
        }
    }

    /// HTTP status a transport answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Allow => StatusCode::OK,
            Self::Deny { severity, .. } => severity.status(),
        }
    }

    pub fn response(&self) -> HookResponse {
        HookResponse {
            err: self.reason().map(str::to_string),
        }
    }
}

impl From<Rejection> for Decision {
    fn from(rejection: Rejection) -> Self {
        let severity = rejection.severity();
        Self::deny(rejection.to_string(), severity)
    }
}

impl From<Result<(), Rejection>> for Decision {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Self::Allow,
            Err(rejection) => rejection.into(),
        }
    }
}

/// Response body of the pre-receive endpoint: `{"err": "<reason>"}` on denial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

/// Log the outcome of one ref update and turn it into a decision.
pub(crate) fn conclude(
    result: Result<(), Rejection>,
    ctx: &PushContext,
    update: &RefUpdate,
) -> Decision {
    let repository = ctx.repository().full_name();
    let user_id = ctx.options().user_id;
    match &result {
        Ok(()) => {
            debug!(
                repository = %repository,
                ref_name = %update.ref_full_name,
                user_id = %user_id,
                "Ref update allowed"
            );
        }
        Err(rejection @ Rejection::Internal { .. }) => {
            error!(
                repository = %repository,
                ref_name = %update.ref_full_name,
                user_id = %user_id,
                old_commit_id = %update.old_commit_id,
                new_commit_id = %update.new_commit_id,
                "Unable to evaluate ref update: {}",
                rejection
            );
        }
        Err(rejection) => {
            warn!(
                repository = %repository,
                ref_name = %update.ref_full_name,
                user_id = %user_id,
                new_commit_id = %update.new_commit_id,
                "Ref update denied: {}",
                rejection
            );
        }
    }
    result.into()
}
