//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module is the **single doorway** to the backend: object store, ref
//! database, working tree and remote transport. Every call returns strong
//! types and normalizes git2 failures into [`GitError`] categories.
//!
//! # Error Handling
//!
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::CasFailed`]: A ref moved between read and write
//! - [`GitError::CheckoutConflict`]: Checkout would overwrite local changes
//! - [`GitError::RemoteNotFound`] / [`GitError::FetchFailed`] / [`GitError::PushFailed`]
//!
//! # Example
//!
//! ```ignore
//! use quire::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head()?;
//! println!("{head:?}");
//! ```

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::types::{BranchName, Oid, RefName, TypeError};

/// Credential callback attempts before giving up on a remote.
const MAX_CREDENTIAL_ATTEMPTS: usize = 3;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Branch creation target already exists.
    #[error("branch already exists: {name}")]
    BranchExists { name: String },

    /// Compare-and-swap precondition failed.
    #[error("CAS failed for {refname}: expected {expected}, found {actual}")]
    CasFailed {
        refname: String,
        expected: String,
        actual: String,
    },

    /// Checkout refused to overwrite local modifications.
    #[error("checkout conflict: {message}")]
    CheckoutConflict { message: String },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound { oid: String },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName { message: String },

    /// Named remote is not configured.
    #[error("remote not found: {remote}")]
    RemoteNotFound { remote: String },

    /// Fetch transport failure.
    #[error("fetch from {remote} failed: {message}")]
    FetchFailed { remote: String, message: String },

    /// Push transport failure or per-ref rejection.
    #[error("push to {remote} failed: {message}")]
    PushFailed { remote: String, message: String },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError { message: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Conflict => GitError::CheckoutConflict {
                message: err.message().to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }

    fn internal(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::Conflict => GitError::CheckoutConflict {
                message: err.message().to_string(),
            },
            _ => GitError::internal(err),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidRefName(msg) => GitError::InvalidRefName { message: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// In-progress operation recorded by a marker in the git directory
/// (`MERGE_HEAD`, `REVERT_HEAD`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GitState {
    /// No operation in progress.
    Clean,

    /// Rebase in progress.
    Rebase {
        /// Current step in the rebase (1-indexed), if available.
        current: Option<usize>,
        /// Total steps in the rebase, if available.
        total: Option<usize>,
    },

    /// Merge in progress.
    Merge,

    /// Cherry-pick in progress.
    CherryPick,

    /// Revert in progress.
    Revert,

    /// Bisect in progress.
    Bisect,

    /// Apply mailbox in progress.
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// ```
    /// use quire::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Revert.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    /// Short human-readable name of the state.
    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase { .. } => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitState::Rebase {
                current: Some(c),
                total: Some(t),
            } => write!(f, "rebase ({}/{})", c, t),
            _ => f.write_str(self.description()),
        }
    }
}

/// Where HEAD points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// Symbolic HEAD on a branch with no commits yet.
    Unborn { branch: Option<BranchName> },
    /// Symbolic HEAD on a local branch.
    Branch { name: BranchName, oid: Oid },
    /// HEAD points directly at a commit.
    Detached { oid: Oid },
}

impl HeadState {
    /// The commit HEAD resolves to, if any.
    pub fn oid(&self) -> Option<&Oid> {
        match self {
            HeadState::Unborn { .. } => None,
            HeadState::Branch { oid, .. } | HeadState::Detached { oid } => Some(oid),
        }
    }

    /// The checked-out branch, if HEAD is symbolic and born.
    pub fn branch(&self) -> Option<&BranchName> {
        match self {
            HeadState::Branch { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// A local branch and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTip {
    pub name: BranchName,
    pub oid: Oid,
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Number of untracked files (if requested)
    pub untracked: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// No staged, unstaged or conflicted entries. Untracked files don't count.
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// Information about a commit.
#[derive(Debug, Clone, Serialize)]
pub struct CommitInfo {
    pub oid: Oid,
    pub parents: Vec<Oid>,
    /// First line of the commit message
    pub summary: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_time: chrono::DateTime<chrono::Utc>,
}

/// An author/committer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub email: String,
}

impl Signature {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// How a checkout treats local modifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutMode {
    /// Refuse (with [`GitError::CheckoutConflict`]) rather than overwrite.
    Safe,
    /// Overwrite whatever is on disk.
    Force,
}

/// Merge analysis of a commit against HEAD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAnalysis {
    /// HEAD already contains the commit.
    UpToDate,
    /// The commit descends from HEAD.
    FastForward,
    /// Histories diverged; a three-way merge is needed.
    Normal,
    /// Nothing sensible to do (unborn HEAD or no merge base).
    Unmergeable,
}

/// Object counts reported by a fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub received_objects: usize,
    pub total_objects: usize,
    pub local_objects: usize,
    pub received_bytes: usize,
}

/// The Git interface.
///
/// The **single point of interaction** with the backend. No other module
/// imports `git2`.
///
/// # CAS Semantics
///
/// Ref moves that were planned from a previously read value go through
/// [`Git::update_ref_cas`], which fails rather than clobbering a ref that
/// changed underneath us.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Ok(Oid::new(oid.to_string())?)
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the working tree.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// The .git directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// The working directory root.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get the in-progress operation recorded by the marker files.
    pub fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => {
                let (current, total) = self.read_rebase_progress();
                GitState::Rebase { current, total }
            }
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    /// Read rebase progress from .git/rebase-merge or .git/rebase-apply.
    fn read_rebase_progress(&self) -> (Option<usize>, Option<usize>) {
        let read_num = |path: PathBuf| -> Option<usize> {
            std::fs::read_to_string(path)
                .ok()
                .and_then(|s| s.trim().parse().ok())
        };

        let git_dir = self.repo.path();
        let rebase_merge = git_dir.join("rebase-merge");
        if rebase_merge.exists() {
            return (
                read_num(rebase_merge.join("msgnum")),
                read_num(rebase_merge.join("end")),
            );
        }

        let rebase_apply = git_dir.join("rebase-apply");
        if rebase_apply.exists() {
            return (
                read_num(rebase_apply.join("next")),
                read_num(rebase_apply.join("last")),
            );
        }

        (None, None)
    }

    /// Clear merge/revert/cherry-pick markers. Index contents are untouched.
    pub fn cleanup_state(&self) -> Result<(), GitError> {
        self.repo.cleanup_state().map_err(GitError::internal)?;
        debug!("cleared operation markers");
        Ok(())
    }

    // =========================================================================
    // Index and Working Tree
    // =========================================================================

    /// Paths with conflict entries in the index, sorted and deduplicated.
    ///
    /// A path contributes one entry however many stages (ancestor, ours,
    /// theirs) it has.
    pub fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let index = self.repo.index().map_err(GitError::internal)?;
        if !index.has_conflicts() {
            return Ok(Vec::new());
        }

        let mut paths = BTreeSet::new();
        for conflict in index.conflicts().map_err(GitError::internal)? {
            let conflict = conflict.map_err(GitError::internal)?;
            for entry in [conflict.our, conflict.their, conflict.ancestor]
                .into_iter()
                .flatten()
            {
                paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        Ok(paths.into_iter().collect())
    }

    /// Stage the working-tree state of each path (additions, modifications
    /// and deletions). Staging a conflicted path resolves its conflict.
    pub fn stage_paths(&self, paths: &[&str]) -> Result<(), GitError> {
        let work_dir = self.work_dir()?;
        let mut index = self.repo.index().map_err(GitError::internal)?;

        for path in paths {
            let rel = Path::new(path);
            if work_dir.join(rel).exists() {
                index
                    .add_path(rel)
                    .map_err(|e| GitError::from_git2(e, path))?;
            } else {
                index
                    .remove_path(rel)
                    .map_err(|e| GitError::from_git2(e, path))?;
            }
        }

        index.write().map_err(GitError::internal)?;
        Ok(())
    }

    /// Get working tree status summary.
    pub fn worktree_status(&self, include_untracked: bool) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(include_untracked)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(GitError::internal)?;

        let mut result = WorktreeStatus::default();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.is_conflicted() {
                result.has_conflicts = true;
            }
            if status.intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE,
            ) {
                result.staged += 1;
            }
            if status.intersects(
                git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE,
            ) {
                result.unstaged += 1;
            }
            if status.is_wt_new() {
                result.untracked += 1;
            }
        }

        Ok(result)
    }

    /// Update the working tree and index to a commit's tree.
    ///
    /// In [`CheckoutMode::Safe`] libgit2 computes every conflict before
    /// writing, so a refused checkout leaves the working tree untouched.
    pub fn checkout_commit(&self, oid: &Oid, mode: CheckoutMode) -> Result<(), GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let mut builder = git2::build::CheckoutBuilder::new();
        match mode {
            CheckoutMode::Safe => builder.safe(),
            CheckoutMode::Force => builder.force(),
        };

        self.repo
            .checkout_tree(commit.as_object(), Some(&mut builder))
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        debug!(commit = %oid.short(7), ?mode, "checked out tree");
        Ok(())
    }

    /// Reset index and working tree to HEAD, discarding conflicts.
    pub fn reset_hard_to_head(&self) -> Result<(), GitError> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        self.repo
            .reset(head.as_object(), git2::ResetType::Hard, None)
            .map_err(GitError::internal)?;
        info!(head = %head.id(), "reset index and working tree to HEAD");
        Ok(())
    }

    // =========================================================================
    // HEAD and Ref Resolution
    // =========================================================================

    /// Where HEAD points: unborn, a branch, or a detached commit.
    pub fn head(&self) -> Result<HeadState, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                return Ok(HeadState::Unborn {
                    branch: self.unborn_branch_name(),
                });
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };

        let oid = from_git2_oid(
            head.peel_to_commit()
                .map_err(|e| GitError::from_git2(e, "HEAD"))?
                .id(),
        )?;

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(HeadState::Branch {
                    name: BranchName::new(name)?,
                    oid,
                });
            }
        }
        Ok(HeadState::Detached { oid })
    }

    fn unborn_branch_name(&self) -> Option<BranchName> {
        let head = self.repo.find_reference("HEAD").ok()?;
        let target = head.symbolic_target()?;
        let name = target.strip_prefix("refs/heads/")?;
        BranchName::new(name).ok()
    }

    /// Get HEAD commit OID.
    ///
    /// # Errors
    ///
    /// - [`GitError::RefNotFound`] if HEAD is unborn
    pub fn head_oid(&self) -> Result<Oid, GitError> {
        self.head()?
            .oid()
            .cloned()
            .ok_or_else(|| GitError::RefNotFound {
                refname: "HEAD".to_string(),
            })
    }

    /// Resolve a ref to the commit it (eventually) points to.
    pub fn resolve_ref(&self, refname: &str) -> Result<Oid, GitError> {
        let reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let oid = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, refname))?
            .id();

        from_git2_oid(oid)
    }

    /// Resolve a ref, returning None if it doesn't exist.
    pub fn try_resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        match self.resolve_ref(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(GitError::RefNotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if a ref exists.
    pub fn ref_exists(&self, refname: &str) -> bool {
        self.repo.find_reference(refname).is_ok()
    }

    /// All local branches with their tips, in the order git2 yields them.
    pub fn list_branches(&self) -> Result<Vec<BranchTip>, GitError> {
        let branches = self
            .repo
            .branches(Some(git2::BranchType::Local))
            .map_err(GitError::internal)?;

        let mut tips = Vec::new();
        for branch in branches {
            let (branch, _) = branch.map_err(GitError::internal)?;
            let Some(name) = branch.name().ok().flatten() else {
                continue; // non-UTF-8 names
            };
            let Ok(name) = BranchName::new(name) else {
                continue;
            };
            let Ok(commit) = branch.get().peel_to_commit() else {
                continue;
            };
            tips.push(BranchTip {
                name,
                oid: from_git2_oid(commit.id())?,
            });
        }

        Ok(tips)
    }

    // =========================================================================
    // Ref Mutation
    // =========================================================================

    /// Create a local branch at `target`. Never overwrites.
    ///
    /// # Errors
    ///
    /// - [`GitError::BranchExists`] if the branch is already there
    pub fn create_branch(&self, name: &BranchName, target: &Oid) -> Result<(), GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(target)?)
            .map_err(|e| GitError::from_git2(e, target.as_str()))?;

        match self.repo.branch(name.as_str(), &commit, false) {
            Ok(_) => {
                info!(branch = %name, at = %target.short(7), "created branch");
                Ok(())
            }
            Err(e) if e.code() == git2::ErrorCode::Exists => Err(GitError::BranchExists {
                name: name.to_string(),
            }),
            Err(e) => Err(GitError::from_git2(e, name.as_str())),
        }
    }

    /// Move (or create) a ref with compare-and-swap semantics.
    ///
    /// With `expected_old = Some(old)` the write is done by libgit2 only if
    /// the ref still points at `old`. With `None` the ref must not exist.
    ///
    /// # Errors
    ///
    /// - [`GitError::CasFailed`] if the current value doesn't match expected
    pub fn update_ref_cas(
        &self,
        refname: &str,
        new_oid: &Oid,
        expected_old: Option<&Oid>,
        message: &str,
    ) -> Result<(), GitError> {
        let new = to_git2_oid(new_oid)?;
        let result = match expected_old {
            Some(old) => {
                self.repo
                    .reference_matching(refname, new, true, to_git2_oid(old)?, message)
            }
            None => self.repo.reference(refname, new, false, message),
        };

        match result {
            Ok(_) => {
                info!(refname, to = %new_oid.short(7), "updated ref");
                Ok(())
            }
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::Modified | git2::ErrorCode::Exists | git2::ErrorCode::NotFound
                ) =>
            {
                let actual = self
                    .try_resolve_ref(refname)
                    .ok()
                    .flatten()
                    .map(String::from)
                    .unwrap_or_else(|| "<none>".to_string());
                Err(GitError::CasFailed {
                    refname: refname.to_string(),
                    expected: expected_old
                        .map(Oid::to_string)
                        .unwrap_or_else(|| "<none>".to_string()),
                    actual,
                })
            }
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    /// Point a ref at a commit unconditionally.
    pub fn set_ref(&self, refname: &str, oid: &Oid, message: &str) -> Result<(), GitError> {
        self.repo
            .reference(refname, to_git2_oid(oid)?, true, message)
            .map_err(|e| GitError::from_git2(e, refname))?;
        debug!(refname, to = %oid.short(7), "set ref");
        Ok(())
    }

    /// Delete a ref, provided it still points at `expected_old`.
    pub fn delete_ref_cas(&self, refname: &str, expected_old: &Oid) -> Result<(), GitError> {
        let mut reference = self
            .repo
            .find_reference(refname)
            .map_err(|e| GitError::from_git2(e, refname))?;

        let actual = reference.target().map(|o| o.to_string());
        if actual.as_deref() != Some(expected_old.as_str()) {
            return Err(GitError::CasFailed {
                refname: refname.to_string(),
                expected: expected_old.to_string(),
                actual: actual.unwrap_or_else(|| "<symbolic>".to_string()),
            });
        }

        reference
            .delete()
            .map_err(|e| GitError::from_git2(e, refname))?;
        info!(refname, "deleted ref");
        Ok(())
    }

    /// Make HEAD a symbolic ref to `refname`.
    pub fn set_head(&self, refname: &RefName) -> Result<(), GitError> {
        self.repo
            .set_head(refname.as_str())
            .map_err(|e| GitError::from_git2(e, refname.as_str()))?;
        debug!(%refname, "HEAD now symbolic");
        Ok(())
    }

    /// Detach HEAD at a commit.
    pub fn set_head_detached(&self, oid: &Oid) -> Result<(), GitError> {
        self.repo
            .set_head_detached(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        debug!(commit = %oid.short(7), "HEAD now detached");
        Ok(())
    }

    // =========================================================================
    // Ancestry Queries
    // =========================================================================

    /// Commits unique to `local` and to `upstream`: `(ahead, behind)`.
    pub fn ahead_behind(&self, local: &Oid, upstream: &Oid) -> Result<(usize, usize), GitError> {
        self.repo
            .graph_ahead_behind(to_git2_oid(local)?, to_git2_oid(upstream)?)
            .map_err(GitError::internal)
    }

    // =========================================================================
    // Merging
    // =========================================================================

    /// Classify merging `their` into HEAD.
    pub fn merge_analysis(&self, their: &Oid) -> Result<MergeAnalysis, GitError> {
        let annotated = self
            .repo
            .find_annotated_commit(to_git2_oid(their)?)
            .map_err(|e| GitError::from_git2(e, their.as_str()))?;

        let (analysis, _preference) = self
            .repo
            .merge_analysis(&[&annotated])
            .map_err(GitError::internal)?;

        Ok(if analysis.is_up_to_date() {
            MergeAnalysis::UpToDate
        } else if analysis.is_fast_forward() {
            MergeAnalysis::FastForward
        } else if analysis.is_normal() {
            MergeAnalysis::Normal
        } else {
            MergeAnalysis::Unmergeable
        })
    }

    /// Three-way merge `their` into HEAD's index and working tree.
    ///
    /// Writes `MERGE_HEAD`. Conflicting paths are left as conflict entries
    /// in the index with markers in the working tree; query them with
    /// [`Git::conflicted_paths`]. No commit is created.
    pub fn merge_into_index(&self, their: &Oid) -> Result<(), GitError> {
        let annotated = self
            .repo
            .find_annotated_commit(to_git2_oid(their)?)
            .map_err(|e| GitError::from_git2(e, their.as_str()))?;

        let mut merge_opts = git2::MergeOptions::new();
        let mut checkout = git2::build::CheckoutBuilder::new();
        checkout.safe().allow_conflicts(true).conflict_style_merge(true);

        self.repo
            .merge(&[&annotated], Some(&mut merge_opts), Some(&mut checkout))
            .map_err(|e| GitError::from_git2(e, their.as_str()))?;
        debug!(their = %their.short(7), "merged into index");
        Ok(())
    }

    /// Write the current index as a tree object.
    pub fn write_index_tree(&self) -> Result<Oid, GitError> {
        let mut index = self.repo.index().map_err(GitError::internal)?;
        let tree = index.write_tree().map_err(GitError::internal)?;
        from_git2_oid(tree)
    }

    /// Create a commit object.
    ///
    /// When `update_ref` is given, libgit2 only moves it if its current
    /// target equals the first parent; otherwise [`GitError::CasFailed`].
    pub fn create_commit(
        &self,
        update_ref: Option<&str>,
        signature: &Signature,
        message: &str,
        tree: &Oid,
        parents: &[Oid],
    ) -> Result<Oid, GitError> {
        let sig = git2::Signature::now(&signature.name, &signature.email)
            .map_err(GitError::internal)?;
        let tree = self
            .repo
            .find_tree(to_git2_oid(tree)?)
            .map_err(|e| GitError::from_git2(e, tree.as_str()))?;

        let parent_commits = parents
            .iter()
            .map(|p| {
                self.repo
                    .find_commit(to_git2_oid(p)?)
                    .map_err(|e| GitError::from_git2(e, p.as_str()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit<'_>> = parent_commits.iter().collect();

        let oid = match self
            .repo
            .commit(update_ref, &sig, &sig, message, &tree, &parent_refs)
        {
            Ok(oid) => oid,
            Err(e) if e.code() == git2::ErrorCode::Modified => {
                return Err(GitError::CasFailed {
                    refname: update_ref.unwrap_or("HEAD").to_string(),
                    expected: parents
                        .first()
                        .map(Oid::to_string)
                        .unwrap_or_else(|| "<none>".to_string()),
                    actual: e.message().to_string(),
                });
            }
            Err(e) => return Err(GitError::internal(e)),
        };

        let oid = from_git2_oid(oid)?;
        info!(commit = %oid.short(7), parents = parents.len(), "created commit");
        Ok(oid)
    }

    /// The identity from git configuration (`user.name` / `user.email`),
    /// if one is configured.
    pub fn configured_signature(&self) -> Option<Signature> {
        match self.repo.signature() {
            Ok(sig) => match (sig.name(), sig.email()) {
                (Some(name), Some(email)) => Some(Signature::new(name, email)),
                _ => None,
            },
            Err(e) => {
                debug!(error = %e.message(), "no identity in git config");
                None
            }
        }
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Get information about a commit.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2_oid(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: oid.clone(),
            parents: commit
                .parent_ids()
                .map(from_git2_oid)
                .collect::<Result<_, _>>()?,
            summary: commit.summary().unwrap_or("").to_string(),
            message: commit.message().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            author_time,
        })
    }

    // =========================================================================
    // Remote Operations
    // =========================================================================

    /// Get the URL for a remote, `None` if the remote doesn't exist.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if matches!(
                e.code(),
                git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec
            ) =>
            {
                Ok(None)
            }
            Err(e) => Err(GitError::internal(e)),
        }
    }

    fn find_remote(&self, name: &str) -> Result<git2::Remote<'_>, GitError> {
        self.repo.find_remote(name).map_err(|e| match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec => GitError::RemoteNotFound {
                remote: name.to_string(),
            },
            _ => GitError::internal(e),
        })
    }

    /// Callbacks that answer credential requests: ssh-agent for ssh keys,
    /// the git credential helper for user/password, default otherwise.
    fn credential_callbacks<'a>(&self) -> git2::RemoteCallbacks<'a> {
        let config = self.repo.config().ok();
        let attempts = Cell::new(0usize);

        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |url, username_from_url, allowed| {
            attempts.set(attempts.get() + 1);
            if attempts.get() > MAX_CREDENTIAL_ATTEMPTS {
                return Err(git2::Error::from_str(
                    "authentication failed: credentials were rejected",
                ));
            }
            if allowed.is_ssh_key() {
                if let Some(user) = username_from_url {
                    return git2::Cred::ssh_key_from_agent(user);
                }
            }
            if allowed.is_user_pass_plaintext() {
                if let Some(cfg) = config.as_ref() {
                    if let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }
            git2::Cred::default()
        });
        callbacks
    }

    /// Fetch from `remote` using its configured refspecs, updating the
    /// remote-tracking refs.
    ///
    /// # Errors
    ///
    /// - [`GitError::RemoteNotFound`] if no such remote is configured
    /// - [`GitError::FetchFailed`] on transport failure
    pub fn fetch(&self, remote: &str) -> Result<FetchStats, GitError> {
        let mut handle = self.find_remote(remote)?;

        let mut options = git2::FetchOptions::new();
        options.remote_callbacks(self.credential_callbacks());

        handle
            .fetch(&[] as &[&str], Some(&mut options), None)
            .map_err(|e| GitError::FetchFailed {
                remote: remote.to_string(),
                message: e.message().to_string(),
            })?;

        let progress = handle.stats();
        let stats = FetchStats {
            received_objects: progress.received_objects(),
            total_objects: progress.total_objects(),
            local_objects: progress.local_objects(),
            received_bytes: progress.received_bytes(),
        };
        info!(remote, received = stats.received_objects, total = stats.total_objects, "fetched");
        Ok(stats)
    }

    /// Push exactly one refspec to `remote`.
    ///
    /// Per-ref rejections reported by the remote (for example a
    /// non-fast-forward update) are errors too.
    ///
    /// # Errors
    ///
    /// - [`GitError::RemoteNotFound`] if no such remote is configured
    /// - [`GitError::PushFailed`] on transport failure or rejection
    pub fn push(&self, remote: &str, refspec: &str) -> Result<(), GitError> {
        let mut handle = self.find_remote(remote)?;
        let rejection: RefCell<Option<String>> = RefCell::new(None);

        {
            let mut callbacks = self.credential_callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(msg) = status {
                    *rejection.borrow_mut() = Some(format!("{refname}: {msg}"));
                }
                Ok(())
            });

            let mut options = git2::PushOptions::new();
            options.remote_callbacks(callbacks);

            handle
                .push(&[refspec], Some(&mut options))
                .map_err(|e| GitError::PushFailed {
                    remote: remote.to_string(),
                    message: e.message().to_string(),
                })?;
        }

        if let Some(message) = rejection.into_inner() {
            return Err(GitError::PushFailed {
                remote: remote.to_string(),
                message,
            });
        }

        info!(remote, refspec, "pushed");
        Ok(())
    }
}
