//! engine::merge
//!
//! Merge Engine: integrate another branch into the checked-out one.
//!
//! The backend's merge analysis picks one of three paths:
//!
//! - **Up to date**: nothing to do.
//! - **Fast-forward**: the working tree is safely checked out at the target,
//!   keeping unrelated local edits, then the branch ref moves (CAS against
//!   the value read). No commit is made.
//! - **Three-way**: the backend merges into the index. Conflicts fail with
//!   [`QuireError::MergeConflict`] and leave `MERGE_HEAD` plus the conflict
//!   entries in place. A clean result is committed with parents
//!   `[current, target]` and the marker is cleared.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::types::{BranchName, Oid, RefName};
use crate::git::{CheckoutMode, GitError, MergeAnalysis};

use super::conflict::ConflictSet;
use super::error::QuireError;
use super::repo::Workspace;
use super::resolve::resolve;
use super::signature::resolve_signature;

/// Outcome of merging a branch into the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// The current branch already contains the target.
    UpToDate { branch: BranchName },
    /// The current branch moved to the target's commit.
    FastForwarded { branch: BranchName, commit: Oid },
    /// A merge commit was created.
    #[serde(rename = "merged_ok")]
    Merged { branch: BranchName, commit: Oid },
}

impl MergeOutcome {
    /// The commit the branch points at after the merge, if it moved.
    pub fn new_commit(&self) -> Option<&Oid> {
        match self {
            MergeOutcome::UpToDate { .. } => None,
            MergeOutcome::FastForwarded { commit, .. } | MergeOutcome::Merged { commit, .. } => {
                Some(commit)
            }
        }
    }
}

/// Commit message for a merge commit.
pub fn merge_message(target: &str, current: &BranchName) -> String {
    format!("Merge branch '{target}' into {current}")
}

impl Workspace {
    /// Merge `name` into the checked-out branch.
    ///
    /// # Errors
    ///
    /// - [`QuireError::DetachedHead`] if no branch is checked out
    /// - [`QuireError::UnsupportedOperation`] if `name` is the current branch
    /// - [`QuireError::BranchNotFound`] if `name` doesn't resolve
    /// - [`QuireError::MergeConflict`] if the three-way merge conflicts
    /// - [`QuireError::SignatureNotConfigured`] if a merge commit is needed
    ///   and no identity is available
    pub fn merge_branch_into_current(&self, name: &str) -> Result<MergeOutcome, QuireError> {
        self.ensure_clean()?;
        let (current, head) = self.require_branch()?;
        if name == current.as_str() {
            return Err(QuireError::UnsupportedOperation(format!(
                "cannot merge '{current}' into itself"
            )));
        }

        let target = resolve(self.git(), name)?
            .ok_or_else(|| QuireError::BranchNotFound(name.to_string()))?;
        if target.refname == RefName::for_branch(&current) {
            return Err(QuireError::UnsupportedOperation(format!(
                "cannot merge '{current}' into itself"
            )));
        }

        let analysis = self.git().merge_analysis(&target.oid)?;
        debug!(%current, target = %target.refname, ?analysis, "merge analysis");

        match analysis {
            MergeAnalysis::UpToDate => Ok(MergeOutcome::UpToDate { branch: current }),
            MergeAnalysis::FastForward => {
                self.fast_forward_current(
                    &current,
                    &head,
                    &target.oid,
                    target.display_name(),
                )?;
                Ok(MergeOutcome::FastForwarded {
                    branch: current,
                    commit: target.oid,
                })
            }
            MergeAnalysis::Normal => {
                let commit = self.merge_into_current(
                    &current,
                    &head,
                    &target.oid,
                    target.display_name(),
                )?;
                Ok(MergeOutcome::Merged {
                    branch: current,
                    commit,
                })
            }
            MergeAnalysis::Unmergeable => Err(QuireError::GenericOperationFailure(format!(
                "'{}' cannot be merged into '{current}'",
                target.display_name()
            ))),
        }
    }

    /// Move the checked-out `branch` from `from` to its descendant `to`.
    ///
    /// The working tree is updated first with a safe checkout: edits to
    /// files the new commits don't touch are carried over, and an edit the
    /// new commits would overwrite fails with `CheckoutConflict` before the
    /// ref moves.
    pub(crate) fn fast_forward_current(
        &self,
        branch: &BranchName,
        from: &Oid,
        to: &Oid,
        target: &str,
    ) -> Result<(), QuireError> {
        self.checkout_safely(to, target)?;

        let refname = RefName::for_branch(branch);
        if let Err(err) = self.git().update_ref_cas(
            refname.as_str(),
            to,
            Some(from),
            &format!("quire: fast-forward to {}", to.short(7)),
        ) {
            warn!(%branch, error = %err, "branch moved during fast-forward, restoring tree");
            if let Err(restore) = self.git().checkout_commit(from, CheckoutMode::Safe) {
                warn!(%branch, error = %restore, "could not restore working tree");
            }
            return Err(err.into());
        }

        info!(%branch, from = %from.short(7), to = %to.short(7), "fast-forwarded");
        Ok(())
    }

    /// Three-way merge `their` into the checked-out `branch` at `head` and
    /// commit the result. Returns the merge commit.
    ///
    /// On conflict the marker and conflict entries are left in place.
    pub(crate) fn merge_into_current(
        &self,
        branch: &BranchName,
        head: &Oid,
        their: &Oid,
        their_name: &str,
    ) -> Result<Oid, QuireError> {
        let signature = resolve_signature(self.git(), self.config())?;

        match self.git().merge_into_index(their) {
            Ok(()) => {}
            Err(GitError::CheckoutConflict { .. }) => {
                return Err(QuireError::CheckoutConflict {
                    target: their_name.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        }

        let conflicts = ConflictSet::new(self.git().conflicted_paths()?);
        if !conflicts.is_empty() {
            warn!(%branch, their = their_name, %conflicts, "merge stopped with conflicts");
            return Err(QuireError::MergeConflict(conflicts));
        }

        let tree = self.git().write_index_tree()?;
        let commit = self.git().create_commit(
            Some("HEAD"),
            &signature,
            &merge_message(their_name, branch),
            &tree,
            &[head.clone(), their.clone()],
        )?;
        self.git().cleanup_state()?;

        info!(%branch, commit = %commit.short(7), "merged");
        Ok(commit)
    }
}

/// Merge `branch_name` into the branch checked out in `repo_root`.
pub fn merge_branch_into_current(
    repo_root: &Path,
    branch_name: &str,
) -> Result<MergeOutcome, QuireError> {
    Workspace::open(repo_root)?.merge_branch_into_current(branch_name)
}
