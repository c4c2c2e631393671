//! git
//!
//! Single interface for all backend operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to the repository. Object store, ref
//! database, working tree and remote transport are all reached through
//! [`Git`]. No other module imports `git2`.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - HEAD and ref operations (read, create, CAS update, delete)
//! - Merge analysis, three-way merge into the index, commit creation
//! - Conflict inspection and staging
//! - Checkout with safe or force semantics
//! - Fetch and push with credential callbacks
//!
//! # Invariants
//!
//! - Ref moves planned from a previously read value use CAS
//! - All operations return strong types (Oid, BranchName, RefName)
//!
//! # Example
//!
//! ```ignore
//! use quire::git::{CheckoutMode, Git};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tip = git.resolve_ref("refs/remotes/origin/main")?;
//! git.checkout_commit(&tip, CheckoutMode::Safe)?;
//! git.set_head_detached(&tip)?;
//! ```

mod interface;

pub use interface::{
    BranchTip, CheckoutMode, CommitInfo, FetchStats, Git, GitError, GitState, HeadState,
    MergeAnalysis, Signature, WorktreeStatus,
};
