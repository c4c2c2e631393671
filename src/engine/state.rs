//! engine::state
//!
//! The "current operation state" query.
//!
//! An interrupted merge or revert leaves a marker (`MERGE_HEAD`,
//! `REVERT_HEAD`, ...) and possibly conflict entries in the index. Both are
//! read here, from the repository itself, on every call. Mutating entry
//! points call [`Workspace::ensure_clean`] before touching refs or the index.

use std::path::Path;

use serde::Serialize;

use crate::core::types::Oid;
use crate::git::{CommitInfo, GitState, HeadState};

use super::conflict::ConflictSet;
use super::error::QuireError;
use super::repo::Workspace;

/// In-progress marker plus any conflict entries in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationState {
    /// The in-progress operation, `None` when no marker is present.
    pub marker: Option<GitState>,
    /// Paths with conflict entries in the index.
    pub conflicts: ConflictSet,
}

impl OperationState {
    pub fn is_clean(&self) -> bool {
        self.marker.is_none() && self.conflicts.is_empty()
    }

    /// Fail if a marker is present or the index holds conflicts.
    pub fn ensure_clean(&self) -> Result<(), QuireError> {
        if let Some(state) = &self.marker {
            return Err(QuireError::OperationInProgress(state.clone()));
        }
        if !self.conflicts.is_empty() {
            return Err(QuireError::MergeConflict(self.conflicts.clone()));
        }
        Ok(())
    }
}

/// Where HEAD is and what is in flight.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub branch: Option<String>,
    pub head: Option<Oid>,
    /// The commit HEAD points at, when born.
    pub last_commit: Option<CommitInfo>,
    pub detached: bool,
    pub operation: OperationState,
    pub staged: usize,
    pub unstaged: usize,
    pub untracked: usize,
}

impl Workspace {
    /// Read the marker and conflict state.
    pub fn operation_state(&self) -> Result<OperationState, QuireError> {
        let marker = match self.git().state() {
            GitState::Clean => None,
            state => Some(state),
        };
        let conflicts = ConflictSet::new(self.git().conflicted_paths()?);
        Ok(OperationState { marker, conflicts })
    }

    /// Shorthand for `operation_state()?.ensure_clean()`.
    pub fn ensure_clean(&self) -> Result<(), QuireError> {
        self.operation_state()?.ensure_clean()
    }

    /// Summarize HEAD, operation state and working tree.
    pub fn status(&self) -> Result<StatusReport, QuireError> {
        let head = self.git().head()?;
        let worktree = self.git().worktree_status(true)?;
        let (branch, detached) = match &head {
            HeadState::Unborn { branch } => (branch.as_ref().map(|b| b.to_string()), false),
            HeadState::Branch { name, .. } => (Some(name.to_string()), false),
            HeadState::Detached { .. } => (None, true),
        };

        let last_commit = head
            .oid()
            .map(|oid| self.git().commit_info(oid))
            .transpose()?;

        Ok(StatusReport {
            branch,
            head: head.oid().cloned(),
            last_commit,
            detached,
            operation: self.operation_state()?,
            staged: worktree.staged,
            unstaged: worktree.unstaged,
            untracked: worktree.untracked,
        })
    }
}

/// The operation state of the repository containing `repo_root`.
pub fn operation_state(repo_root: &Path) -> Result<OperationState, QuireError> {
    Workspace::open(repo_root)?.operation_state()
}

/// Status summary of the repository containing `repo_root`.
pub fn repository_status(repo_root: &Path) -> Result<StatusReport, QuireError> {
    Workspace::open(repo_root)?.status()
}
