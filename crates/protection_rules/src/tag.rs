//! Tag protection rules.
//!
//! A tag rule names the users and teams allowed to create, move or delete the
//! tags matching its pattern. Patterns wrapped in slashes (`/^v\d+/`) are
//! regular expressions; anything else is a glob.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{RuleError, TeamId, TeamMembership, UserId};

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;

/// Protection settings for the tags matching a name pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagProtectionRule {
    pub name_pattern: String,

    #[serde(default)]
    pub allowlist_user_ids: Vec<UserId>,

    #[serde(default)]
    pub allowlist_team_ids: Vec<TeamId>,
}

/// A compiled tag name pattern.
#[derive(Debug, Clone)]
pub enum TagNamePattern {
    Glob(Pattern),
    Regex(Regex),
}

impl TagNamePattern {
    pub fn matches(&self, tag: &str) -> bool {
        match self {
            Self::Glob(pattern) => pattern.matches(tag),
            Self::Regex(regex) => regex.is_match(tag),
        }
    }
}

impl TagProtectionRule {
    pub fn new(name_pattern: impl Into<String>) -> Self {
        Self {
            name_pattern: name_pattern.into(),
            allowlist_user_ids: Vec::new(),
            allowlist_team_ids: Vec::new(),
        }
    }

    /// Compile the name pattern.
    pub fn compile(&self) -> Result<TagNamePattern, RuleError> {
        let invalid = |message: String| RuleError::InvalidTagPattern {
            pattern: self.name_pattern.clone(),
            message,
        };

        let expression = self.name_pattern.as_str();
        if expression.len() >= 2 && expression.starts_with('/') && expression.ends_with('/') {
            let regex = Regex::new(&expression[1..expression.len() - 1])
                .map_err(|e| invalid(e.to_string()))?;
            return Ok(TagNamePattern::Regex(regex));
        }

        Pattern::new(expression)
            .map(TagNamePattern::Glob)
            .map_err(|e| invalid(e.to_string()))
    }

    /// Whether `user` is on this rule's allow-list, directly or through a team.
    pub async fn is_user_allowed(
        &self,
        user: UserId,
        teams: &dyn TeamMembership,
    ) -> Result<bool, RuleError> {
        if self.allowlist_user_ids.contains(&user) {
            return Ok(true);
        }
        if self.allowlist_team_ids.is_empty() {
            return Ok(false);
        }
        teams.is_user_in_teams(user, &self.allowlist_team_ids).await
    }
}

/// Decide whether `user` may create, update or delete the tag `tag_name`.
///
/// Rules are walked in store order. Rules whose pattern does not match the tag
/// are skipped. The first matching rule that allows the user ends the walk with
/// `true`; if rules matched but none allowed the user the result is `false`.
/// A tag matched by no rule is unprotected and always allowed.
///
/// # Errors
///
/// * `RuleError::InvalidTagPattern` - a rule's pattern does not compile
/// * `RuleError::TeamLookup` - team membership could not be resolved
pub async fn is_user_allowed_to_control_tag(
    rules: &[TagProtectionRule],
    tag_name: &str,
    user: UserId,
    teams: &dyn TeamMembership,
) -> Result<bool, RuleError> {
    let mut allowed = true;
    for rule in rules {
        if !rule.compile()?.matches(tag_name) {
            continue;
        }
        allowed = rule.is_user_allowed(user, teams).await?;
        if allowed {
            break;
        }
    }
    Ok(allowed)
}
