//! sync command - Fetch, integrate, push

use anyhow::Result;

use crate::cli::Context;
use crate::engine::{self, IntegrationOutcome, PushOutcome, SyncOptions, SyncResult};

pub fn sync(
    ctx: &Context,
    remote: Option<String>,
    branch: Option<String>,
    no_push: bool,
) -> Result<()> {
    let options = SyncOptions {
        remote,
        branch,
        push: no_push.then_some(false),
        allow_no_push: no_push,
    };
    let result = engine::sync_repository(&ctx.cwd, &options)?;
    ctx.report(&result, || describe(&result))
}

fn describe(result: &SyncResult) -> String {
    let integration = match &result.integration {
        IntegrationOutcome::NoRemoteBranch => "no remote branch yet".to_string(),
        IntegrationOutcome::UpToDate => "up to date".to_string(),
        IntegrationOutcome::LocalAhead => "local is ahead".to_string(),
        IntegrationOutcome::FastForwarded { commit } => {
            format!("fast-forwarded to {}", commit.short(7))
        }
        IntegrationOutcome::Merged { commit } => format!("merged as {}", commit.short(7)),
    };
    let push = match &result.push {
        PushOutcome::Pushed { .. } => "pushed",
        PushOutcome::NothingToPush => "nothing to push",
        PushOutcome::Skipped => "push skipped",
    };
    format!(
        "Synced '{}' with '{}': {integration}, {push}",
        result.branch, result.remote
    )
}
