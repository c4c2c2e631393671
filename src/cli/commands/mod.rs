//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! Each handler:
//! 1. Calls one engine operation
//! 2. Renders its result through [`Context::report`]
//!
//! Handlers do NOT mutate the repository themselves.

mod branch;
mod completion;
mod conflicts;
mod merge;
mod status;
mod switch;
mod sync;

pub use branch::{create, list};
pub use completion::completion;
pub use conflicts::{abort, resolve, stage};
pub use merge::merge;
pub use status::status;
pub use switch::switch;
pub use sync::sync;

use anyhow::Result;

use crate::cli::args::{BranchAction, Command};
use crate::cli::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Branch(BranchAction::Create { name }) => branch::create(ctx, &name),
        Command::Branch(BranchAction::List) => branch::list(ctx),
        Command::Switch { name } => switch::switch(ctx, &name),
        Command::Merge { branch } => merge::merge(ctx, &branch),
        Command::Sync {
            remote,
            branch,
            no_push,
        } => sync::sync(ctx, remote, branch, no_push),
        Command::Stage { paths } => conflicts::stage(ctx, &paths),
        Command::Resolve { path } => conflicts::resolve(ctx, &path),
        Command::Abort => conflicts::abort(ctx),
        Command::Status => status::status(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}
