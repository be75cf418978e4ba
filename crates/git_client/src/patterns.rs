//! File path globs used by branch protection rules.

use glob::{MatchOptions, Pattern};
use tracing::warn;

use crate::Error;

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;

// Paths and patterns are both lowercased before matching and `*` may cross
// directory separators, so `*.secrets` matches `config/app.secrets`.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled list of file globs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilePatterns {
    patterns: Vec<Pattern>,
}

impl FilePatterns {
    /// Compile the given globs, skipping (and logging) any that are invalid.
    ///
    /// Blank entries are ignored.
    pub fn parse<I, S>(expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for expression in expressions {
            let expression = expression.as_ref().trim();
            if expression.is_empty() {
                continue;
            }
            match Pattern::new(&expression.to_lowercase()) {
                Ok(pattern) => patterns.push(pattern),
                Err(e) => warn!(pattern = expression, error = %e, "Ignoring invalid file pattern"),
            }
        }
        Self { patterns }
    }

    /// Compile the given globs, failing on the first invalid one.
    pub fn try_parse<I, S>(expressions: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut patterns = Vec::new();
        for expression in expressions {
            let expression = expression.as_ref().trim();
            if expression.is_empty() {
                continue;
            }
            let pattern =
                Pattern::new(&expression.to_lowercase()).map_err(|e| Error::InvalidPattern {
                    pattern: expression.to_string(),
                    message: e.to_string(),
                })?;
            patterns.push(pattern);
        }
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether any pattern matches the path.
    pub fn matches(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        self.patterns
            .iter()
            .any(|pattern| pattern.matches_with(&path, MATCH_OPTIONS))
    }
}
