//! `git2` implementation of the plumbing operations.
//!
//! The repository is opened for every call on tokio's blocking thread pool:
//! `git2::Repository` cannot be shared between threads and opening is cheap
//! compared to walking history.
//! Object directories from the push environment are registered as disk
//! alternates so that quarantined objects are visible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use git2::{BranchType, ErrorCode, Repository};
use tracing::{debug, error, warn};

use crate::{
    CommitId, Error, FilePatterns, GitEnvironment, GitPlumbingClient, SignatureVerifier,
    VerificationOutcome,
};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Plumbing client for a repository on the local filesystem.
pub struct Git2PlumbingClient {
    path: PathBuf,
    verifier: Arc<dyn SignatureVerifier>,
}

impl Git2PlumbingClient {
    /// Create a client for the repository at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - Path of the repository (bare or with a working directory)
    /// * `verifier` - Verifier used for signed-commit checks
    pub fn new(path: impl Into<PathBuf>, verifier: Arc<dyn SignatureVerifier>) -> Self {
        Self {
            path: path.into(),
            verifier,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the branch HEAD points to, if HEAD is symbolic.
    pub fn head_branch(&self) -> Result<Option<String>, Error> {
        let repo = open_repository(&self.path, &GitEnvironment::new())?;
        let head = repo
            .find_reference("HEAD")
            .map_err(|e| Error::git("find HEAD", e))?;
        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .map(str::to_string))
    }

    /// Paths changed between the merge base of `old` and `new`, and `new`.
    fn changed_files(
        repo: &Repository,
        old: &CommitId,
        new: &CommitId,
    ) -> Result<Vec<String>, Error> {
        let new_oid = new.to_oid()?;
        let new_tree = repo
            .find_commit(new_oid)
            .and_then(|commit| commit.tree())
            .map_err(|e| Error::git("read new tree", e))?;

        let base_tree = if old.is_empty() {
            None
        } else {
            let old_oid = old.to_oid()?;
            let base = match repo.merge_base(old_oid, new_oid) {
                Ok(base) => base,
                Err(e) if e.code() == ErrorCode::NotFound => old_oid,
                Err(e) => return Err(Error::git("merge-base", e)),
            };
            Some(
                repo.find_commit(base)
                    .and_then(|commit| commit.tree())
                    .map_err(|e| Error::git("read base tree", e))?,
            )
        };

        let diff = repo
            .diff_tree_to_tree(base_tree.as_ref(), Some(&new_tree), None)
            .map_err(|e| Error::git("diff", e))?;

        let files = diff
            .deltas()
            .filter_map(|delta| delta.new_file().path().or_else(|| delta.old_file().path()))
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
        Ok(files)
    }

    /// Run `operation` against the repository on the blocking thread pool.
    ///
    /// History walks and the signature verifier may take a long time and must
    /// not stall the async runtime.
    async fn run_blocking<T, F>(
        &self,
        env: &GitEnvironment,
        name: &'static str,
        operation: F,
    ) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&Repository) -> Result<T, Error> + Send + 'static,
    {
        let path = self.path.clone();
        let env = env.clone();
        tokio::task::spawn_blocking(move || {
            let repo = open_repository(&path, &env)?;
            operation(&repo)
        })
        .await
        .map_err(|e| {
            error!(operation = name, "Blocking git task failed: {}", e);
            Error::TaskFailed {
                operation: name.to_string(),
                message: e.to_string(),
            }
        })?
    }
}

fn open_repository(path: &Path, env: &GitEnvironment) -> Result<Repository, Error> {
    let repo = Repository::open(path).map_err(|e| {
        error!(path = ?path, "Failed to open repository: {}", e);
        Error::OpenRepository {
            path: path.display().to_string(),
            message: e.message().to_string(),
        }
    })?;

    let directories = env.object_directories();
    if !directories.is_empty() {
        let odb = repo.odb().map_err(|e| Error::git("open object database", e))?;
        for dir in directories {
            if !dir.is_dir() {
                warn!(directory = ?dir, "Skipping missing object directory");
                continue;
            }
            odb.add_disk_alternate(&dir.to_string_lossy())
                .map_err(|e| Error::git("add object directory", e))?;
            debug!(directory = ?dir, "Registered object directory");
        }
    }

    Ok(repo)
}

/// Signatures of the commits reachable from `new` but not from `old`.
///
/// For a new ref every commit already reachable from an existing ref is
/// excluded, so only the commits introduced by the push are checked.
fn verify_range(
    repo: &Repository,
    verifier: &dyn SignatureVerifier,
    old: &CommitId,
    new: &CommitId,
) -> Result<VerificationOutcome, Error> {
    let mut walk = repo.revwalk().map_err(|e| Error::git("rev-list", e))?;
    walk.push(new.to_oid()?)
        .map_err(|e| Error::git("rev-list", e))?;
    if old.is_empty() {
        walk.hide_glob("refs/*")
            .map_err(|e| Error::git("rev-list", e))?;
    } else {
        walk.hide(old.to_oid()?)
            .map_err(|e| Error::git("rev-list", e))?;
    }

    for oid in walk {
        let oid = oid.map_err(|e| Error::git("rev-list", e))?;
        let commit = CommitId::from(oid);
        let (signature, signed_data) = match repo.extract_signature(&oid, None) {
            Ok(parts) => parts,
            Err(e) if e.code() == ErrorCode::NotFound => {
                debug!(commit = %commit, "Commit is not signed");
                return Ok(VerificationOutcome::Unverified(commit));
            }
            Err(e) => return Err(Error::git("extract signature", e)),
        };
        if !verifier.verify(&commit, &signature, &signed_data)? {
            debug!(commit = %commit, "Commit signature did not verify");
            return Ok(VerificationOutcome::Unverified(commit));
        }
    }

    Ok(VerificationOutcome::Verified)
}

#[async_trait]
impl GitPlumbingClient for Git2PlumbingClient {
    async fn is_ancestor(
        &self,
        env: &GitEnvironment,
        ancestor: &CommitId,
        descendant: &CommitId,
    ) -> Result<bool, Error> {
        if ancestor == descendant {
            return Ok(true);
        }
        let ancestor = ancestor.to_oid()?;
        let descendant = descendant.to_oid()?;
        self.run_blocking(env, "rev-list", move |repo| {
            repo.graph_descendant_of(descendant, ancestor)
                .map_err(|e| Error::git("rev-list", e))
        })
        .await
    }

    async fn matched_files(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
        patterns: &FilePatterns,
        limit: usize,
    ) -> Result<Vec<String>, Error> {
        let (old, new, patterns) = (old.clone(), new.clone(), patterns.clone());
        self.run_blocking(env, "diff", move |repo| {
            let mut matched = Vec::new();
            for path in Self::changed_files(repo, &old, &new)? {
                if patterns.matches(&path) {
                    matched.push(path);
                    if limit > 0 && matched.len() >= limit {
                        break;
                    }
                }
            }
            Ok(matched)
        })
        .await
    }

    async fn only_matching_files(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
        patterns: &FilePatterns,
    ) -> Result<bool, Error> {
        let (old, new, patterns) = (old.clone(), new.clone(), patterns.clone());
        self.run_blocking(env, "diff", move |repo| {
            let changed = Self::changed_files(repo, &old, &new)?;
            Ok(changed.iter().all(|path| patterns.matches(path)))
        })
        .await
    }

    async fn verify_commits(
        &self,
        env: &GitEnvironment,
        old: &CommitId,
        new: &CommitId,
    ) -> Result<VerificationOutcome, Error> {
        let (old, new) = (old.clone(), new.clone());
        let verifier = Arc::clone(&self.verifier);
        self.run_blocking(env, "verify commits", move |repo| {
            verify_range(repo, verifier.as_ref(), &old, &new)
        })
        .await
    }

    async fn branch_exists(&self, env: &GitEnvironment, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.run_blocking(env, "find branch", move |repo| {
            let exists = match repo.find_branch(&name, BranchType::Local) {
                Ok(_) => true,
                Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => false,
                Err(e) => return Err(Error::git("find branch", e)),
            };
            Ok(exists)
        })
        .await
    }

    async fn is_empty(&self, env: &GitEnvironment) -> Result<bool, Error> {
        self.run_blocking(env, "is-empty", |repo| {
            repo.is_empty().map_err(|e| Error::git("is-empty", e))
        })
        .await
    }
}
