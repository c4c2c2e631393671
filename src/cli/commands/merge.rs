//! merge command - Merge a branch into the current one

use anyhow::Result;

use crate::cli::Context;
use crate::engine::{self, MergeOutcome};

pub fn merge(ctx: &Context, branch: &str) -> Result<()> {
    let outcome = engine::merge_branch_into_current(&ctx.cwd, branch)?;
    ctx.report(&outcome, || match &outcome {
        MergeOutcome::UpToDate { branch } => format!("'{branch}' is already up to date"),
        MergeOutcome::FastForwarded { branch, commit } => {
            format!("Fast-forwarded '{branch}' to {}", commit.short(7))
        }
        MergeOutcome::Merged { branch, commit } => {
            format!("Merged into '{branch}' as {}", commit.short(7))
        }
    })
}
