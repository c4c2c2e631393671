//! engine::resolve
//!
//! Short-name branch resolution across the local and remote-tracking
//! namespaces.
//!
//! The lookup order lives in one place, [`candidates`]:
//!
//! 1. `refs/heads/<name>`
//! 2. `refs/remotes/<name>` (a remote-tracking branch written in full, `origin/topic`)
//! 3. if `name` starts with `origin/`: `refs/remotes/origin/<name>`
//! 4. if `name` has no `/`: `refs/remotes/origin/<name>`
//!
//! Rule 3 covers a branch on `origin` whose own name begins with `origin/`,
//! whose tracking ref is therefore `refs/remotes/origin/origin/...`. It is a
//! special case for that collision and is not extended to other remotes.
//!
//! The first candidate that exists wins.

use serde::Serialize;
use tracing::debug;

use crate::core::config::DEFAULT_REMOTE;
use crate::core::types::{Oid, RefName};
use crate::git::{Git, GitError};

/// Namespace a resolved branch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Local,
    RemoteTracking,
}

/// A branch name resolved to a ref and the commit it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBranch {
    pub refname: RefName,
    pub kind: BranchKind,
    pub oid: Oid,
}

impl ResolvedBranch {
    pub fn is_local(&self) -> bool {
        self.kind == BranchKind::Local
    }

    /// `main` for a local branch, `origin/main` for a remote-tracking one.
    pub fn display_name(&self) -> &str {
        match self.kind {
            BranchKind::Local => self.refname.branch_shorthand(),
            BranchKind::RemoteTracking => self.refname.remote_shorthand(),
        }
        .unwrap_or_else(|| self.refname.as_str())
    }
}

/// Ordered refs to try for `name`. Names that can't form a valid ref
/// produce no candidates.
pub fn candidates(name: &str) -> Vec<(RefName, BranchKind)> {
    let mut out = Vec::with_capacity(3);
    let mut push = |full: String, kind: BranchKind| {
        if let Ok(refname) = RefName::new(full) {
            if !out.iter().any(|(r, _)| r == &refname) {
                out.push((refname, kind));
            }
        }
    };

    push(format!("refs/heads/{name}"), BranchKind::Local);
    push(format!("refs/remotes/{name}"), BranchKind::RemoteTracking);

    let origin_prefix = format!("{DEFAULT_REMOTE}/");
    if name.starts_with(&origin_prefix) || !name.contains('/') {
        push(
            format!("refs/remotes/{DEFAULT_REMOTE}/{name}"),
            BranchKind::RemoteTracking,
        );
    }

    out
}

/// Resolve `name` to the first candidate ref that exists.
pub fn resolve(git: &Git, name: &str) -> Result<Option<ResolvedBranch>, GitError> {
    for (refname, kind) in candidates(name) {
        if let Some(oid) = git.try_resolve_ref(refname.as_str())? {
            debug!(name, %refname, ?kind, "resolved branch");
            return Ok(Some(ResolvedBranch { refname, kind, oid }));
        }
    }
    debug!(name, "no branch matched");
    Ok(None)
}
