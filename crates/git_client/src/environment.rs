//! Git environment forwarded to plumbing operations.
//!
//! During a push, git keeps the incoming objects in a quarantine directory and
//! tells hooks where to find them through environment variables. The hook
//! request carries those values; they are collected here once per push and
//! handed to every plumbing call so that the not-yet-accepted commits can be
//! inspected.

use std::path::PathBuf;

#[cfg(test)]
#[path = "environment_tests.rs"]
mod tests;

/// Variable listing additional object directories, separated like `PATH`.
pub const GIT_ALTERNATIVE_OBJECT_DIRECTORIES: &str = "GIT_ALTERNATE_OBJECT_DIRECTORIES";

/// Variable naming the object directory of the push.
pub const GIT_OBJECT_DIRECTORY: &str = "GIT_OBJECT_DIRECTORY";

/// Variable naming the quarantine directory of the push.
pub const GIT_QUARANTINE_PATH: &str = "GIT_QUARANTINE_PATH";

/// Ordered set of environment variables for plumbing operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitEnvironment {
    vars: Vec<(String, String)>,
}

impl GitEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the environment from the object directory hints of a push.
    ///
    /// Empty or missing hints are left out. The order is always alternates,
    /// object directory, quarantine path.
    pub fn from_hints(
        alternative_object_directories: Option<&str>,
        object_directory: Option<&str>,
        quarantine_path: Option<&str>,
    ) -> Self {
        let mut env = Self::new();
        for (name, value) in [
            (GIT_ALTERNATIVE_OBJECT_DIRECTORIES, alternative_object_directories),
            (GIT_OBJECT_DIRECTORY, object_directory),
            (GIT_QUARANTINE_PATH, quarantine_path),
        ] {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                env.vars.push((name.to_string(), value.to_string()));
            }
        }
        env
    }

    /// Build the environment from the variables of the current process.
    ///
    /// Used when running as a git hook, where git exports the hints itself.
    pub fn from_process() -> Self {
        let read = |name: &str| std::env::var(name).ok();
        Self::from_hints(
            read(GIT_ALTERNATIVE_OBJECT_DIRECTORIES).as_deref(),
            read(GIT_OBJECT_DIRECTORY).as_deref(),
            read(GIT_QUARANTINE_PATH).as_deref(),
        )
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Every object directory named by the environment, without duplicates.
    pub fn object_directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();

        if let Some(value) = self.get(GIT_OBJECT_DIRECTORY) {
            dirs.push(PathBuf::from(value));
        }
        if let Some(value) = self.get(GIT_ALTERNATIVE_OBJECT_DIRECTORIES) {
            dirs.extend(std::env::split_paths(value).filter(|p| !p.as_os_str().is_empty()));
        }
        if let Some(value) = self.get(GIT_QUARANTINE_PATH) {
            dirs.push(PathBuf::from(value));
        }

        let mut unique = Vec::with_capacity(dirs.len());
        for dir in dirs {
            if !unique.contains(&dir) {
                unique.push(dir);
            }
        }
        unique
    }
}
