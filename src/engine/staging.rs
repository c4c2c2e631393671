//! engine::staging
//!
//! Index mutations around conflicts: selective staging, file-by-file
//! resolution, and aborting a merge.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::core::types::Oid;
use crate::git::GitState;

use super::conflict::ConflictSet;
use super::error::QuireError;
use super::repo::Workspace;

/// Paths staged by [`Workspace::stage_paths`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedPaths {
    pub paths: Vec<String>,
}

/// A conflict resolved by [`Workspace::resolve_conflict`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConflict {
    pub path: String,
    /// Conflicts still left in the index.
    pub remaining: ConflictSet,
}

/// What [`Workspace::abort_merge`] discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortedMerge {
    /// The marker that was present, if any.
    pub aborted: Option<GitState>,
    /// Conflicts that were discarded.
    pub discarded: ConflictSet,
    /// HEAD after the reset.
    pub head: Oid,
}

impl Workspace {
    /// Stage the working-tree content of `paths`.
    ///
    /// # Errors
    ///
    /// - [`QuireError::OperationInProgress`] while a marker is present
    /// - [`QuireError::MergeConflict`] while the index holds conflicts
    pub fn stage_paths(&self, paths: &[&str]) -> Result<StagedPaths, QuireError> {
        self.ensure_clean()?;
        if paths.is_empty() {
            return Err(QuireError::UnsupportedOperation(
                "no paths given to stage".to_string(),
            ));
        }

        self.git().stage_paths(paths)?;
        info!(count = paths.len(), "staged paths");
        Ok(StagedPaths {
            paths: paths.iter().map(|p| p.to_string()).collect(),
        })
    }

    /// Mark one conflicting path resolved by staging its working-tree
    /// content. Allowed during a merge; other markers are refused.
    ///
    /// # Errors
    ///
    /// - [`QuireError::GenericOperationFailure`] if `path` is not in conflict
    pub fn resolve_conflict(&self, path: &str) -> Result<ResolvedConflict, QuireError> {
        let state = self.operation_state()?;
        match &state.marker {
            None | Some(GitState::Merge) => {}
            Some(other) => return Err(QuireError::OperationInProgress(other.clone())),
        }
        if !state.conflicts.contains(path) {
            return Err(QuireError::GenericOperationFailure(format!(
                "'{path}' is not in conflict"
            )));
        }

        self.git().stage_paths(&[path])?;
        let remaining = ConflictSet::new(self.git().conflicted_paths()?);
        info!(path, remaining = remaining.len(), "resolved conflict");
        Ok(ResolvedConflict {
            path: path.to_string(),
            remaining,
        })
    }

    /// Discard an in-progress merge: reset index and working tree to HEAD
    /// and clear the marker.
    ///
    /// # Errors
    ///
    /// - [`QuireError::GenericOperationFailure`] if there is nothing to abort
    pub fn abort_merge(&self) -> Result<AbortedMerge, QuireError> {
        let state = self.operation_state()?;
        if state.is_clean() {
            return Err(QuireError::GenericOperationFailure(
                "no merge in progress".to_string(),
            ));
        }
        let head = self
            .require_commits()?
            .oid()
            .cloned()
            .ok_or(QuireError::RepositoryEmpty)?;

        self.git().reset_hard_to_head()?;
        self.git().cleanup_state()?;

        info!(head = %head.short(7), discarded = state.conflicts.len(), "aborted merge");
        Ok(AbortedMerge {
            aborted: state.marker,
            discarded: state.conflicts,
            head,
        })
    }

    /// Paths currently in conflict.
    pub fn conflicted_paths(&self) -> Result<ConflictSet, QuireError> {
        Ok(ConflictSet::new(self.git().conflicted_paths()?))
    }
}

/// Stage `paths` in the repository containing `repo_root`.
pub fn stage_paths(repo_root: &Path, paths: &[&str]) -> Result<StagedPaths, QuireError> {
    Workspace::open(repo_root)?.stage_paths(paths)
}

/// Resolve one conflicting path.
pub fn resolve_conflict(repo_root: &Path, path: &str) -> Result<ResolvedConflict, QuireError> {
    Workspace::open(repo_root)?.resolve_conflict(path)
}

/// Abort an in-progress merge.
pub fn abort_merge(repo_root: &Path) -> Result<AbortedMerge, QuireError> {
    Workspace::open(repo_root)?.abort_merge()
}

/// Current conflict set.
pub fn conflicted_paths(repo_root: &Path) -> Result<ConflictSet, QuireError> {
    Workspace::open(repo_root)?.conflicted_paths()
}
