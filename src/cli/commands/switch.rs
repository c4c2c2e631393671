//! switch command - Switch branches

use anyhow::Result;

use crate::cli::Context;
use crate::engine::{self, SwitchOutcome};
use crate::ui::output;

pub fn switch(ctx: &Context, name: &str) -> Result<()> {
    let outcome = engine::switch_to_branch(&ctx.cwd, name)?;
    if outcome.is_detached() && !ctx.json {
        output::warn(
            "commits made here belong to no branch; use `quire branch create` to keep them",
            ctx.verbosity,
        );
    }
    ctx.report(&outcome, || match &outcome {
        SwitchOutcome::Switched { branch, .. } => format!("Switched to '{branch}'"),
        SwitchOutcome::AlreadyOnBranch { branch } => format!("Already on '{branch}'"),
        SwitchOutcome::DetachedAtRemote {
            remote_branch,
            head,
        } => format!(
            "HEAD is now detached at '{remote_branch}' ({})",
            head.short(7)
        ),
    })
}
