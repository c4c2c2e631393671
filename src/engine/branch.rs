//! engine::branch
//!
//! Branch Manager: create, list and switch local branches.
//!
//! # Invariants
//!
//! - After creating or switching to a local branch, HEAD is symbolic and
//!   points at it.
//! - Switching to a remote-tracking branch leaves HEAD detached at its tip.
//! - A refused checkout changes nothing: refs, HEAD and the working tree
//!   are as they were.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::core::types::{BranchName, Oid, RefName};

use super::error::QuireError;
use super::repo::{parse_branch_name, Workspace};
use super::resolve::{resolve, BranchKind};

/// A freshly created and checked-out branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedBranch {
    pub name: BranchName,
    pub head: Oid,
}

/// One local branch in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchEntry {
    pub name: BranchName,
    pub oid: Oid,
    pub is_current: bool,
}

/// Outcome of a switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SwitchOutcome {
    /// HEAD now points at the local branch.
    #[serde(rename = "success")]
    Switched { branch: BranchName, head: Oid },
    /// HEAD already pointed at the branch; nothing changed.
    AlreadyOnBranch { branch: BranchName },
    /// HEAD is detached at a remote-tracking branch's tip.
    DetachedAtRemote { remote_branch: String, head: Oid },
}

impl SwitchOutcome {
    pub fn is_detached(&self) -> bool {
        matches!(self, SwitchOutcome::DetachedAtRemote { .. })
    }

    /// Local branch name or `remote/branch` shorthand.
    pub fn branch_name(&self) -> &str {
        match self {
            SwitchOutcome::Switched { branch, .. } | SwitchOutcome::AlreadyOnBranch { branch } => {
                branch.as_str()
            }
            SwitchOutcome::DetachedAtRemote { remote_branch, .. } => remote_branch,
        }
    }
}

impl Workspace {
    /// Create `name` at HEAD's commit and switch to it.
    ///
    /// # Errors
    ///
    /// - [`QuireError::InvalidBranchName`] if `name` isn't a valid branch name
    /// - [`QuireError::RepositoryEmpty`] if HEAD is unborn
    /// - [`QuireError::BranchAlreadyExists`] if a local branch `name` exists
    pub fn create_and_switch_branch(&self, name: &str) -> Result<CreatedBranch, QuireError> {
        let name = parse_branch_name(name)?;
        self.ensure_clean()?;
        let head = self.require_commits()?;
        let oid = head
            .oid()
            .cloned()
            .ok_or(QuireError::RepositoryEmpty)?;

        let refname = RefName::for_branch(&name);
        if self.git().ref_exists(refname.as_str()) {
            return Err(QuireError::BranchAlreadyExists(name.to_string()));
        }

        self.git().create_branch(&name, &oid)?;

        let switched = self
            .checkout_safely(&oid, name.as_str())
            .and_then(|()| self.git().set_head(&refname).map_err(QuireError::from));
        if let Err(err) = switched {
            warn!(branch = %name, error = %err, "switch failed, removing new branch");
            if let Err(cleanup) = self.git().delete_ref_cas(refname.as_str(), &oid) {
                warn!(branch = %name, error = %cleanup, "could not remove new branch");
            }
            return Err(err);
        }

        info!(branch = %name, head = %oid.short(7), "created and switched");
        Ok(CreatedBranch { name, head: oid })
    }

    /// All local branches, sorted by name, with the current one flagged.
    pub fn list_branches(&self) -> Result<Vec<BranchEntry>, QuireError> {
        let head = self.git().head()?;
        let current = head.branch();

        let mut entries: Vec<BranchEntry> = self
            .git()
            .list_branches()?
            .into_iter()
            .map(|tip| BranchEntry {
                is_current: current == Some(&tip.name),
                name: tip.name,
                oid: tip.oid,
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Switch to a local branch, or detach at a remote-tracking branch.
    ///
    /// `name` is resolved local-first, then against remote-tracking refs
    /// (see [`super::resolve`]).
    ///
    /// # Errors
    ///
    /// - [`QuireError::BranchNotFound`] if nothing matches
    /// - [`QuireError::CheckoutConflict`] if uncommitted changes would be
    ///   overwritten (nothing is modified)
    pub fn switch_to_branch(&self, name: &str) -> Result<SwitchOutcome, QuireError> {
        self.ensure_clean()?;
        let head = self.require_commits()?;
        let target = resolve(self.git(), name)?
            .ok_or_else(|| QuireError::BranchNotFound(name.to_string()))?;

        match target.kind {
            BranchKind::Local => {
                let branch = parse_branch_name(target.display_name())?;
                if head.branch() == Some(&branch) {
                    return Ok(SwitchOutcome::AlreadyOnBranch { branch });
                }

                self.checkout_safely(&target.oid, branch.as_str())?;
                self.git()
                    .set_head(&target.refname)
                    .inspect_err(|err| warn!(error = %err, "tree updated but HEAD was not"))?;

                info!(%branch, head = %target.oid.short(7), "switched");
                Ok(SwitchOutcome::Switched {
                    branch,
                    head: target.oid,
                })
            }
            BranchKind::RemoteTracking => {
                let remote_branch = target.display_name().to_string();
                self.checkout_safely(&target.oid, &remote_branch)?;
                self.git()
                    .set_head_detached(&target.oid)
                    .inspect_err(|err| warn!(error = %err, "tree updated but HEAD was not"))?;

                info!(%remote_branch, head = %target.oid.short(7), "detached at remote branch");
                Ok(SwitchOutcome::DetachedAtRemote {
                    remote_branch,
                    head: target.oid,
                })
            }
        }
    }
}

/// Create `name` at HEAD and switch to it.
pub fn create_and_switch_branch(repo_root: &Path, name: &str) -> Result<CreatedBranch, QuireError> {
    Workspace::open(repo_root)?.create_and_switch_branch(name)
}

/// Local branches sorted by name. Empty for a repository with no commits.
pub fn list_branches(repo_root: &Path) -> Result<Vec<BranchEntry>, QuireError> {
    Workspace::open(repo_root)?.list_branches()
}

/// Switch HEAD to `name`.
pub fn switch_to_branch(repo_root: &Path, name: &str) -> Result<SwitchOutcome, QuireError> {
    Workspace::open(repo_root)?.switch_to_branch(name)
}
