//! stage, resolve and abort commands - Working through a conflicted merge

use anyhow::Result;

use crate::cli::Context;
use crate::engine;

/// Stage files for the next commit.
pub fn stage(ctx: &Context, paths: &[String]) -> Result<()> {
    let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
    let staged = engine::stage_paths(&ctx.cwd, &paths)?;
    ctx.report(&staged, || format!("Staged {} path(s)", staged.paths.len()))
}

/// Mark one conflicting path resolved.
pub fn resolve(ctx: &Context, path: &str) -> Result<()> {
    let resolved = engine::resolve_conflict(&ctx.cwd, path)?;
    ctx.report(&resolved, || {
        if resolved.remaining.is_empty() {
            format!("Resolved '{path}'; no conflicts remain, commit to finish")
        } else {
            format!(
                "Resolved '{path}'; still in conflict: {}",
                resolved.remaining
            )
        }
    })
}

/// Abort an in-progress merge.
pub fn abort(ctx: &Context) -> Result<()> {
    let aborted = engine::abort_merge(&ctx.cwd)?;
    ctx.report(&aborted, || {
        format!("Aborted; back at {}", aborted.head.short(7))
    })
}
