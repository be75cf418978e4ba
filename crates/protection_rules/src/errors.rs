//! Errors raised while loading or evaluating protection rules.

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Protection rule errors.
///
/// All of these are infrastructure failures for the push policy engine: a
/// rule that cannot be evaluated never silently allows or denies a push.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A tag rule's name pattern is neither a valid glob nor a valid `/regex/`.
    #[error("Invalid tag pattern '{pattern}': {message}")]
    InvalidTagPattern { pattern: String, message: String },

    /// A branch rule's name is not a valid glob.
    #[error("Invalid branch pattern '{pattern}': {message}")]
    InvalidBranchPattern { pattern: String, message: String },

    /// A branch rule lists a file pattern that does not compile.
    #[error("Invalid file pattern in rule for branch '{branch}': {source}")]
    InvalidFilePattern {
        branch: String,
        #[source]
        source: git_client::Error,
    },

    /// The rule store could not be read.
    #[error("Protection rule store error: {0}")]
    Store(String),

    /// Team membership could not be resolved.
    #[error("Team membership lookup failed: {0}")]
    TeamLookup(String),

    /// A rule file could not be parsed.
    #[error("Failed to parse protection rules: {0}")]
    Parse(#[from] toml::de::Error),
}
