//! status command - Current branch and operation state

use anyhow::Result;

use crate::cli::Context;
use crate::engine;

pub fn status(ctx: &Context) -> Result<()> {
    let report = engine::repository_status(&ctx.cwd)?;
    ctx.report(&report, || {
        let mut lines = Vec::new();
        match (&report.branch, &report.head) {
            (Some(branch), Some(head)) => lines.push(format!("On '{branch}' at {}", head.short(7))),
            (Some(branch), None) => lines.push(format!("On '{branch}' (no commits yet)")),
            (None, Some(head)) => lines.push(format!("HEAD detached at {}", head.short(7))),
            (None, None) => lines.push("HEAD is unborn".to_string()),
        }
        if let Some(commit) = &report.last_commit {
            lines.push(format!(
                "Last commit: {} ({}, {})",
                commit.summary,
                commit.author_name,
                commit.author_time.format("%Y-%m-%d %H:%M")
            ));
        }
        if let Some(marker) = &report.operation.marker {
            lines.push(format!("A {marker} is in progress"));
        }
        if !report.operation.conflicts.is_empty() {
            lines.push(format!("Conflicts: {}", report.operation.conflicts));
        }
        lines.push(format!(
            "{} staged, {} modified, {} untracked",
            report.staged, report.unstaged, report.untracked
        ));
        lines.join("\n")
    })
}
