//! Property-based tests for core domain types and pure engine helpers.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use quire::core::types::{BranchName, Oid, RefName};
use quire::engine::resolve::{candidates, BranchKind};
use quire::engine::sync::{IntegrationOutcome, PushOutcome, SyncStatus};
use quire::engine::ConflictSet;

/// Strategy for generating valid branch name characters.
fn branch_name_char() -> impl Strategy<Value = char> {
    prop_oneof![
        prop::char::range('a', 'z'),
        prop::char::range('A', 'Z'),
        prop::char::range('0', '9'),
        Just('-'),
        Just('_'),
        Just('.'),
        Just('/'),
    ]
}

/// Strategy for generating valid branch names.
fn valid_branch_name() -> impl Strategy<Value = String> {
    prop::collection::vec(branch_name_char(), 1..40).prop_filter_map(
        "must be valid branch name",
        |chars| {
            let name: String = chars.into_iter().collect();
            let bad = name == "@"
                || name.starts_with('-')
                || name.starts_with('/')
                || name.ends_with('/')
                || name.ends_with('.')
                || name.contains("..")
                || name.contains("//")
                || name
                    .split('/')
                    .any(|c| c.starts_with('.') || c.ends_with(".lock"));
            (!bad).then_some(name)
        },
    )
}

/// Strategy for generating valid hex OIDs.
fn valid_oid_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec![
            '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f',
        ]),
        40,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for repository-relative paths.
fn repo_path() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,6}", 1..4).prop_map(|parts| parts.join("/"))
}

fn integration_outcome() -> impl Strategy<Value = IntegrationOutcome> {
    let commit = Oid::new("a".repeat(40)).unwrap();
    prop_oneof![
        Just(IntegrationOutcome::NoRemoteBranch),
        Just(IntegrationOutcome::UpToDate),
        Just(IntegrationOutcome::LocalAhead),
        Just(IntegrationOutcome::FastForwarded {
            commit: commit.clone()
        }),
        Just(IntegrationOutcome::Merged { commit }),
    ]
}

fn push_outcome() -> impl Strategy<Value = PushOutcome> {
    prop_oneof![
        Just(PushOutcome::Pushed {
            refspec: "refs/heads/main:refs/heads/main".into()
        }),
        Just(PushOutcome::NothingToPush),
        Just(PushOutcome::Skipped),
    ]
}

proptest! {
    #[test]
    fn generated_branch_names_are_accepted(name in valid_branch_name()) {
        let branch = BranchName::new(&name).unwrap();
        prop_assert_eq!(branch.as_str(), name.as_str());
    }

    #[test]
    fn branch_name_serde_roundtrip(name in valid_branch_name()) {
        let branch = BranchName::new(&name).unwrap();
        let json = serde_json::to_string(&branch).unwrap();
        let parsed: BranchName = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(branch, parsed);
    }

    #[test]
    fn double_dot_never_valid(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
        let name = format!("{a}..{b}");
        let branch = BranchName::new(&name);
        let full = RefName::new(format!("refs/heads/{name}"));
        prop_assert!(branch.is_err());
        prop_assert!(full.is_err());
    }

    #[test]
    fn branch_refname_roundtrip(name in valid_branch_name()) {
        let branch = BranchName::new(&name).unwrap();
        let refname = RefName::for_branch(&branch);
        prop_assert!(refname.is_branch_ref());
        prop_assert!(!refname.is_remote_ref());
        prop_assert_eq!(refname.branch_shorthand(), Some(name.as_str()));
    }

    #[test]
    fn oid_short_is_prefix(oid_str in valid_oid_string(), len in 1usize..45) {
        let oid = Oid::new(&oid_str).unwrap();
        let short = oid.short(len);
        prop_assert!(oid.as_str().starts_with(short));
        prop_assert_eq!(short.len(), len.min(40));
    }

    #[test]
    fn oid_normalized_to_lowercase(oid_str in valid_oid_string()) {
        let upper = Oid::new(oid_str.to_uppercase()).unwrap();
        prop_assert_eq!(upper.as_str(), oid_str.as_str());
    }

    /// The local branch is always tried first.
    #[test]
    fn local_candidate_comes_first(name in valid_branch_name()) {
        let list = candidates(&name);
        prop_assert!(!list.is_empty());
        let (first, kind) = &list[0];
        prop_assert_eq!(first.as_str(), format!("refs/heads/{name}"));
        prop_assert_eq!(*kind, BranchKind::Local);
        prop_assert!(list[1..].iter().all(|(_, k)| *k == BranchKind::RemoteTracking));
    }

    /// The `origin/` fallback applies to bare names and `origin/`-prefixed names only.
    #[test]
    fn origin_fallback_scope(name in valid_branch_name()) {
        let list = candidates(&name);
        let fallback = format!("refs/remotes/origin/{name}");
        let has_fallback = list.iter().any(|(r, _)| r.as_str() == fallback);
        let expected = !name.contains('/') || name.starts_with("origin/");
        prop_assert_eq!(has_fallback, expected);
        prop_assert_eq!(list.len(), if expected { 3 } else { 2 });
    }

    #[test]
    fn candidates_are_distinct(name in valid_branch_name()) {
        let list = candidates(&name);
        for (i, (a, _)) in list.iter().enumerate() {
            prop_assert!(list[i + 1..].iter().all(|(b, _)| a != b));
        }
    }

    #[test]
    fn conflict_set_sorted_and_unique(paths in prop::collection::vec(repo_path(), 0..12)) {
        let set = ConflictSet::new(paths.clone());
        let listed = set.paths();
        prop_assert!(listed.windows(2).all(|w| w[0] < w[1]));
        for path in &paths {
            prop_assert!(set.contains(path));
        }
    }

    #[test]
    fn conflict_set_order_independent(paths in prop::collection::vec(repo_path(), 0..12)) {
        let mut reversed = paths.clone();
        reversed.reverse();
        let mut doubled = paths.clone();
        doubled.extend(paths.iter().cloned());
        prop_assert_eq!(ConflictSet::new(paths.clone()), ConflictSet::new(reversed));
        prop_assert_eq!(ConflictSet::new(paths), ConflictSet::new(doubled));
    }

    /// A completed push always reports `pushed`, a skipped push never does.
    #[test]
    fn sync_status_follows_push(
        integration in integration_outcome(),
        push in push_outcome(),
    ) {
        let status = SyncStatus::derive(&integration, &push);
        match push {
            PushOutcome::Pushed { .. } => prop_assert_eq!(status, SyncStatus::Pushed),
            PushOutcome::Skipped => prop_assert!(status != SyncStatus::Pushed),
            PushOutcome::NothingToPush => prop_assert!(matches!(
                status,
                SyncStatus::UpToDate | SyncStatus::Integrated
            )),
        }
    }
}
