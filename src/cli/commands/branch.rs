//! branch command - Create and list local branches

use anyhow::Result;

use crate::cli::Context;
use crate::engine;

/// Create a branch at HEAD and switch to it.
pub fn create(ctx: &Context, name: &str) -> Result<()> {
    let created = engine::create_and_switch_branch(&ctx.cwd, name)?;
    ctx.report(&created, || {
        format!(
            "Created and switched to '{}' at {}",
            created.name,
            created.head.short(7)
        )
    })
}

/// List local branches, marking the current one.
pub fn list(ctx: &Context) -> Result<()> {
    let branches = engine::list_branches(&ctx.cwd)?;
    ctx.report(&branches, || {
        branches
            .iter()
            .map(|b| {
                let marker = if b.is_current { '*' } else { ' ' };
                format!("{marker} {} {}", b.name, b.oid.short(7))
            })
            .collect::<Vec<_>>()
            .join("\n")
    })
}
