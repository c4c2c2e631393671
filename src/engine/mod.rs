//! engine
//!
//! The porcelain operations.
//!
//! # Components
//!
//! - [`repo`] - Repository Handle Resolver ([`Workspace`])
//! - [`branch`] - Branch Manager: create, list, switch
//! - [`merge`] - Merge Engine: up-to-date / fast-forward / three-way
//! - [`sync`] - Sync Orchestrator: fetch, integrate, push
//! - [`state`] - Current operation state (merge/revert markers, conflicts)
//! - [`staging`] - Selective staging, conflict resolution, abort
//! - [`resolve`] - Short-name branch resolution
//!
//! # Contract
//!
//! Every operation returns a structured, serializable result or a
//! [`QuireError`]. Nothing here prints or prompts.
//!
//! # Example
//!
//! ```no_run
//! use quire::engine::{sync_repository, SyncOptions};
//! use std::path::Path;
//!
//! let result = sync_repository(Path::new("."), &SyncOptions::default())?;
//! println!("{:?}", result.status);
//! # Ok::<(), quire::engine::QuireError>(())
//! ```

pub mod branch;
pub mod conflict;
pub mod error;
pub mod merge;
pub mod repo;
pub mod resolve;
pub mod signature;
pub mod staging;
pub mod state;
pub mod sync;

pub use branch::{
    create_and_switch_branch, list_branches, switch_to_branch, BranchEntry, CreatedBranch,
    SwitchOutcome,
};
pub use conflict::ConflictSet;
pub use error::{PushHint, QuireError};
pub use merge::{merge_branch_into_current, MergeOutcome};
pub use repo::{open_repository, Workspace};
pub use resolve::{BranchKind, ResolvedBranch};
pub use staging::{
    abort_merge, conflicted_paths, resolve_conflict, stage_paths, AbortedMerge, ResolvedConflict,
    StagedPaths,
};
pub use state::{operation_state, repository_status, OperationState, StatusReport};
pub use sync::{
    sync_repository, FetchSummary, IntegrationOutcome, PushOutcome, SyncOptions, SyncResult,
    SyncStatus,
};
