//! quire - branch, merge and sync porcelain for writers
//!
//! quire drives a git repository through a small set of operations: create,
//! list and switch branches; merge a branch into the current one; and sync a
//! branch with its remote (fetch, integrate, push). Conflicts are left in the
//! index for the user to resolve file by file.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - The porcelain operations and their error taxonomy
//! - [`core`] - Strong types and configuration
//! - [`git`] - Single interface for all backend operations
//! - [`ui`] - Terminal output
//!
//! # Example
//!
//! ```no_run
//! use quire::engine::{self, MergeOutcome};
//! use std::path::Path;
//!
//! let repo = Path::new(".");
//! engine::create_and_switch_branch(repo, "chapter-4")?;
//! match engine::merge_branch_into_current(repo, "main")? {
//!     MergeOutcome::UpToDate { .. } => {}
//!     outcome => println!("{outcome:?}"),
//! }
//! # Ok::<(), quire::engine::QuireError>(())
//! ```

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
