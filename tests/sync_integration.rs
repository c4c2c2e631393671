//! Integration tests for the Sync Orchestrator.
//!
//! Each test uses a bare remote, the clone under test, and a second clone
//! that pushes "someone else's" work.

mod common;

use common::RemoteSetup;

use quire::engine::{
    IntegrationOutcome, PushHint, PushOutcome, QuireError, SyncOptions, SyncStatus,
};

fn sync_default() -> SyncOptions {
    SyncOptions::default()
}

#[test]
fn fast_forward_sync() {
    let setup = RemoteSetup::new();
    let c2 = setup.push_from_other("chapter.txt", "new pages\n", "C2");

    let result = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap();

    assert!(matches!(
        result.integration,
        IntegrationOutcome::FastForwarded { ref commit } if commit.as_str() == c2
    ));
    assert_eq!(result.push, PushOutcome::NothingToPush);
    assert_eq!(result.status, SyncStatus::Integrated);
    assert_eq!(setup.local.rev("main"), c2);
    assert_eq!(setup.local.read("chapter.txt"), "new pages\n");
}

#[test]
fn fast_forward_sync_keeps_unsaved_draft() {
    let setup = RemoteSetup::new();
    let c2 = setup.push_from_other("chapter.txt", "new pages\n", "C2");
    setup.local.write("README.md", "# my unsaved draft\n");

    let result = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap();

    assert!(matches!(result.integration, IntegrationOutcome::FastForwarded { .. }));
    assert_eq!(setup.local.rev("main"), c2);
    assert_eq!(setup.local.read("README.md"), "# my unsaved draft\n");
    assert_eq!(setup.local.read("chapter.txt"), "new pages\n");
}

#[test]
fn fast_forward_sync_refuses_overlapping_edit() {
    let setup = RemoteSetup::new();
    let before = setup.local.rev("main");
    setup.push_from_other("README.md", "# Remote draft\n", "C2");
    setup.local.write("README.md", "# my unsaved draft\n");

    let err = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap_err();

    assert!(matches!(err, QuireError::CheckoutConflict { .. }));
    assert_eq!(setup.local.rev("main"), before);
    assert_eq!(setup.local.read("README.md"), "# my unsaved draft\n");
}

#[test]
fn rejected_push_is_classified_non_fast_forward() {
    let setup = RemoteSetup::new();
    setup.local.commit_file("local.txt", "mine\n", "C2a");
    setup.push_from_other("remote.txt", "theirs\n", "C2b");

    let err = setup
        .local
        .git()
        .push("origin", "refs/heads/main:refs/heads/main")
        .unwrap_err();
    let err = QuireError::from(err);

    assert!(matches!(
        err,
        QuireError::PushError {
            hint: Some(PushHint::NonFastForward),
            ..
        }
    ));
    let message = err.to_string();
    assert!(message.contains("origin"));
    assert!(!message.contains(".."));
}

#[test]
fn diverged_clean_merge_is_pushed() {
    let setup = RemoteSetup::new();
    let c2a = setup.local.commit_file("local.txt", "mine\n", "C2a");
    let c2b = setup.push_from_other("remote.txt", "theirs\n", "C2b");

    let result = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap();

    let IntegrationOutcome::Merged { commit } = &result.integration else {
        panic!("expected merge, got {:?}", result.integration);
    };
    assert_eq!(setup.local.parents("main"), [c2a, c2b]);
    assert_eq!(
        result.push,
        PushOutcome::Pushed {
            refspec: "refs/heads/main:refs/heads/main".into()
        }
    );
    assert_eq!(result.status, SyncStatus::Pushed);
    assert_eq!(
        setup.remote_rev("refs/heads/main").as_deref(),
        Some(commit.as_str())
    );
    assert_eq!(
        setup.local.rev("refs/remotes/origin/main"),
        commit.as_str()
    );
}

#[test]
fn diverged_conflicting_merge_stops_before_push() {
    let setup = RemoteSetup::new();
    let local_before = setup.local.commit_file("README.md", "# Local draft\n", "C2a");
    let remote_before = setup.push_from_other("README.md", "# Remote draft\n", "C2b");

    let err = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap_err();

    assert!(matches!(err, QuireError::MergeConflict(_)));
    assert_eq!(
        err.conflicts().map(|c| c.paths().to_vec()),
        Some(vec!["README.md".to_string()])
    );
    assert_eq!(setup.local.rev("main"), local_before);
    assert_eq!(
        setup.remote_rev("refs/heads/main").as_deref(),
        Some(remote_before.as_str())
    );
    assert!(setup.local.read("README.md").contains("<<<<<<<"));
    // Marker cleared, conflicts still visible
    assert!(!setup.local.has_marker("MERGE_HEAD"));
    assert!(setup.local.short_status().contains("UU README.md"));
}

#[test]
fn leftover_conflicts_block_next_sync() {
    let setup = RemoteSetup::new();
    setup.local.commit_file("README.md", "# Local\n", "C2a");
    setup.push_from_other("README.md", "# Remote\n", "C2b");
    let ws = setup.local.workspace();
    ws.sync_repository(&sync_default()).unwrap_err();

    let err = ws.sync_repository(&sync_default()).unwrap_err();
    assert!(matches!(err, QuireError::MergeConflict(_)));

    ws.abort_merge().unwrap();
    assert!(ws.operation_state().unwrap().is_clean());
}

#[test]
fn new_branch_is_pushed() {
    let setup = RemoteSetup::new();
    setup.local.git_cmd(&["checkout", "-q", "-b", "feature"]);
    let tip = setup.local.commit_file("feature.txt", "f\n", "feature");

    let result = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap();

    assert_eq!(result.integration, IntegrationOutcome::NoRemoteBranch);
    assert!(matches!(result.push, PushOutcome::Pushed { .. }));
    assert_eq!(
        setup.remote_rev("refs/heads/feature").as_deref(),
        Some(tip.as_str())
    );
}

#[test]
fn second_sync_is_idempotent() {
    let setup = RemoteSetup::new();
    setup.push_from_other("chapter.txt", "pages\n", "C2");
    setup.local.commit_file("notes.txt", "notes\n", "local");
    let ws = setup.local.workspace();
    ws.sync_repository(&sync_default()).unwrap();

    let local_before = setup.local.rev("main");
    let remote_before = setup.remote_rev("refs/heads/main");

    let again = ws.sync_repository(&sync_default()).unwrap();

    assert_eq!(again.integration, IntegrationOutcome::UpToDate);
    assert_eq!(again.push, PushOutcome::NothingToPush);
    assert_eq!(again.status, SyncStatus::UpToDate);
    assert_eq!(setup.local.rev("main"), local_before);
    assert_eq!(setup.remote_rev("refs/heads/main"), remote_before);
}

#[test]
fn local_ahead_pushes() {
    let setup = RemoteSetup::new();
    let tip = setup.local.commit_file("more.txt", "more\n", "ahead");

    let result = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap();

    assert_eq!(result.integration, IntegrationOutcome::LocalAhead);
    assert_eq!(result.status, SyncStatus::Pushed);
    assert_eq!(
        setup.remote_rev("refs/heads/main").as_deref(),
        Some(tip.as_str())
    );
}

#[test]
fn no_push_requires_opt_in() {
    let setup = RemoteSetup::new();
    let options = SyncOptions {
        push: Some(false),
        ..SyncOptions::default()
    };

    let err = setup
        .local
        .workspace()
        .sync_repository(&options)
        .unwrap_err();
    assert!(matches!(err, QuireError::UnsupportedOperation(_)));
}

#[test]
fn no_push_skips_push_stage() {
    let setup = RemoteSetup::new();
    let remote_before = setup.remote_rev("refs/heads/main");
    setup.local.commit_file("draft.txt", "d\n", "local only");
    let options = SyncOptions {
        push: Some(false),
        allow_no_push: true,
        ..SyncOptions::default()
    };

    let result = setup.local.workspace().sync_repository(&options).unwrap();

    assert_eq!(result.push, PushOutcome::Skipped);
    assert_eq!(result.status, SyncStatus::LocalOnly);
    assert_eq!(setup.remote_rev("refs/heads/main"), remote_before);
}

#[test]
fn detached_head_without_branch_fails_early() {
    let setup = RemoteSetup::new();
    setup.local.git_cmd(&["checkout", "-q", "--detach"]);
    let err = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap_err();
    assert!(matches!(err, QuireError::DetachedHead));
}

#[test]
fn unknown_remote() {
    let setup = RemoteSetup::new();
    let options = SyncOptions {
        remote: Some("nowhere".into()),
        ..SyncOptions::default()
    };
    let err = setup
        .local
        .workspace()
        .sync_repository(&options)
        .unwrap_err();
    assert!(matches!(err, QuireError::RemoteNotFound(r) if r == "nowhere"));
}

#[test]
fn unreachable_remote_is_fetch_error() {
    let setup = RemoteSetup::new();
    setup
        .local
        .git_cmd(&["remote", "set-url", "origin", "/nonexistent/quire-remote"]);
    let err = setup
        .local
        .workspace()
        .sync_repository(&sync_default())
        .unwrap_err();
    assert!(matches!(err, QuireError::FetchError { .. }));
}

#[test]
fn explicit_branch_not_checked_out_fast_forwards_ref() {
    let setup = RemoteSetup::new();
    setup.other.git_cmd(&["checkout", "-q", "-b", "appendix"]);
    setup.push_from_other("appendix.txt", "a\n", "appendix start");
    setup.local.git_cmd(&["fetch", "-q", "origin"]);
    setup
        .local
        .git_cmd(&["branch", "appendix", "origin/appendix"]);
    let tip = setup.push_from_other("appendix.txt", "a\nb\n", "appendix more");

    let options = SyncOptions {
        branch: Some("appendix".into()),
        ..SyncOptions::default()
    };
    let result = setup.local.workspace().sync_repository(&options).unwrap();

    assert!(matches!(result.integration, IntegrationOutcome::FastForwarded { .. }));
    assert_eq!(setup.local.rev("appendix"), tip);
    assert_eq!(
        setup.local.symbolic_head().as_deref(),
        Some("refs/heads/main")
    );
    assert!(!setup.local.path().join("appendix.txt").exists());
}

#[test]
fn explicit_branch_must_exist() {
    let setup = RemoteSetup::new();
    let options = SyncOptions {
        branch: Some("missing".into()),
        ..SyncOptions::default()
    };
    let err = setup
        .local
        .workspace()
        .sync_repository(&options)
        .unwrap_err();
    assert!(matches!(err, QuireError::BranchNotFound(_)));
}
