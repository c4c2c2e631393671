//! engine::sync
//!
//! Sync Orchestrator: fetch, integrate, push.
//!
//! # Pipeline
//!
//! 1. **Target**: the explicit branch, or the checked-out one. Detached HEAD
//!    without an explicit branch fails before any network activity.
//! 2. **Fetch** from the remote using its configured refspecs.
//! 3. **Integrate** the remote-tracking ref into the local branch, reusing
//!    the Merge Engine's fast-forward and three-way paths.
//! 4. **Push** `refs/heads/<b>:refs/heads/<b>` if the local branch is now
//!    strictly ahead of the remote (or the remote has no such branch).
//!    The ahead/behind delta is recomputed here since integration moves it.
//!
//! A conflicting integration clears the merge marker but keeps the index
//! conflicts and the markers in the working tree, then fails with
//! [`QuireError::MergeConflict`]. The local and remote refs are unchanged.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::types::{BranchName, Oid, RefName};
use crate::git::{FetchStats, HeadState};

use super::error::QuireError;
use super::repo::{parse_branch_name, Workspace};

/// Caller-supplied sync parameters. `None` falls back to configuration.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Remote name (config `remote`, else `origin`).
    pub remote: Option<String>,
    /// Branch to sync (the checked-out branch when `None`).
    pub branch: Option<String>,
    /// Push after integrating (config `push`, else `true`).
    pub push: Option<bool>,
    /// Required alongside `push = Some(false)`.
    pub allow_no_push: bool,
}

/// Object counts reported by the fetch stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub received_objects: usize,
    pub total_objects: usize,
}

impl From<FetchStats> for FetchSummary {
    fn from(stats: FetchStats) -> Self {
        Self {
            received_objects: stats.received_objects,
            total_objects: stats.total_objects,
        }
    }
}

/// Local integration stage result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IntegrationOutcome {
    /// The remote has no branch of this name.
    NoRemoteBranch,
    UpToDate,
    /// Local has commits the remote lacks and nothing to integrate.
    LocalAhead,
    FastForwarded { commit: Oid },
    #[serde(rename = "merged_ok")]
    Merged { commit: Oid },
}

/// Push stage result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushOutcome {
    Pushed { refspec: String },
    NothingToPush,
    /// Push was disabled for this sync.
    Skipped,
}

/// Overall sync status, derived from the integration and push stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing changed anywhere.
    UpToDate,
    /// The remote branch was updated.
    Pushed,
    /// The local branch changed (or was already ahead) and nothing was pushed.
    Integrated,
    /// Push was skipped and the local branch differs from the remote.
    LocalOnly,
}

impl SyncStatus {
    pub fn derive(integration: &IntegrationOutcome, push: &PushOutcome) -> Self {
        match (integration, push) {
            (_, PushOutcome::Pushed { .. }) => SyncStatus::Pushed,
            (IntegrationOutcome::UpToDate, PushOutcome::NothingToPush | PushOutcome::Skipped) => {
                SyncStatus::UpToDate
            }
            (_, PushOutcome::Skipped) => SyncStatus::LocalOnly,
            (
                IntegrationOutcome::NoRemoteBranch
                | IntegrationOutcome::LocalAhead
                | IntegrationOutcome::FastForwarded { .. }
                | IntegrationOutcome::Merged { .. },
                PushOutcome::NothingToPush,
            ) => SyncStatus::Integrated,
        }
    }
}

/// Aggregated result of one sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub branch: BranchName,
    pub remote: String,
    pub fetch: FetchSummary,
    pub integration: IntegrationOutcome,
    pub push: PushOutcome,
    pub status: SyncStatus,
}

/// Refspec pushing a local branch to the same name on the remote.
pub fn push_refspec(branch: &BranchName) -> String {
    let refname = RefName::for_branch(branch);
    format!("{refname}:{refname}")
}

impl Workspace {
    /// Fetch, integrate and push one branch.
    ///
    /// # Errors
    ///
    /// - [`QuireError::UnsupportedOperation`] for `push = Some(false)`
    ///   without `allow_no_push`, or a diverged branch that isn't checked out
    /// - [`QuireError::DetachedHead`] if no branch is given and HEAD is detached
    /// - [`QuireError::RemoteNotFound`] / [`QuireError::FetchError`]
    /// - [`QuireError::MergeConflict`] if integration conflicts (nothing is pushed)
    /// - [`QuireError::PushError`] on push failure, with an advisory hint
    pub fn sync_repository(&self, options: &SyncOptions) -> Result<SyncResult, QuireError> {
        let push = match options.push {
            Some(false) if !options.allow_no_push => {
                return Err(QuireError::UnsupportedOperation(
                    "sync without push requires allow_no_push".to_string(),
                ))
            }
            Some(push) => push,
            None => self.config().push(),
        };
        let remote = options
            .remote
            .clone()
            .unwrap_or_else(|| self.config().remote().to_string());

        self.ensure_clean()?;
        let head = self.git().head()?;
        let branch = self.sync_target(options.branch.as_deref(), &head)?;
        let checked_out = head.branch() == Some(&branch);
        debug!(%branch, %remote, push, checked_out, "sync target");

        if let Some(url) = self.git().remote_url(&remote)? {
            debug!(%remote, %url, "fetching");
        }
        let fetch = FetchSummary::from(self.git().fetch(&remote)?);

        let integration = self.integrate(&branch, &remote, checked_out)?;
        debug!(%branch, ?integration, "integration stage done");

        let push = if push {
            self.push_stage(&branch, &remote)?
        } else {
            PushOutcome::Skipped
        };

        let status = SyncStatus::derive(&integration, &push);
        info!(%branch, %remote, ?status, "sync finished");
        Ok(SyncResult {
            branch,
            remote,
            fetch,
            integration,
            push,
            status,
        })
    }

    fn sync_target(
        &self,
        explicit: Option<&str>,
        head: &HeadState,
    ) -> Result<BranchName, QuireError> {
        match explicit {
            Some(name) => {
                let branch = parse_branch_name(name)?;
                if !self.git().ref_exists(RefName::for_branch(&branch).as_str()) {
                    return Err(QuireError::BranchNotFound(name.to_string()));
                }
                Ok(branch)
            }
            None => match head {
                HeadState::Branch { name, .. } => Ok(name.clone()),
                HeadState::Detached { .. } => Err(QuireError::DetachedHead),
                HeadState::Unborn { .. } => Err(QuireError::RepositoryEmpty),
            },
        }
    }

    fn integrate(
        &self,
        branch: &BranchName,
        remote: &str,
        checked_out: bool,
    ) -> Result<IntegrationOutcome, QuireError> {
        let local_ref = RefName::for_branch(branch);
        let tracking_ref = RefName::for_remote_branch(remote, branch);

        let local = self.git().resolve_ref(local_ref.as_str())?;
        let Some(upstream) = self.git().try_resolve_ref(tracking_ref.as_str())? else {
            return Ok(IntegrationOutcome::NoRemoteBranch);
        };
        if local == upstream {
            return Ok(IntegrationOutcome::UpToDate);
        }

        let (ahead, behind) = self.git().ahead_behind(&local, &upstream)?;
        debug!(%branch, ahead, behind, "local vs remote-tracking");

        if behind == 0 {
            return Ok(IntegrationOutcome::LocalAhead);
        }

        let their_name = format!("{remote}/{branch}");
        if ahead == 0 {
            if checked_out {
                self.fast_forward_current(branch, &local, &upstream, &their_name)?;
            } else {
                self.git().update_ref_cas(
                    local_ref.as_str(),
                    &upstream,
                    Some(&local),
                    &format!("quire: fast-forward to {}", upstream.short(7)),
                )?;
                info!(%branch, to = %upstream.short(7), "fast-forwarded branch ref");
            }
            return Ok(IntegrationOutcome::FastForwarded { commit: upstream });
        }

        if !checked_out {
            return Err(QuireError::UnsupportedOperation(format!(
                "'{branch}' has diverged from '{remote}/{branch}'; check it out to merge"
            )));
        }

        match self.merge_into_current(branch, &local, &upstream, &their_name) {
            Ok(commit) => Ok(IntegrationOutcome::Merged { commit }),
            Err(QuireError::MergeConflict(conflicts)) => {
                self.git().cleanup_state()?;
                warn!(%branch, %conflicts, "sync left conflicts in the index");
                Err(QuireError::MergeConflict(conflicts))
            }
            Err(e) => Err(e),
        }
    }

    fn push_stage(&self, branch: &BranchName, remote: &str) -> Result<PushOutcome, QuireError> {
        let local_ref = RefName::for_branch(branch);
        let tracking_ref = RefName::for_remote_branch(remote, branch);

        let local = self.git().resolve_ref(local_ref.as_str())?;
        let should_push = match self.git().try_resolve_ref(tracking_ref.as_str())? {
            None => true,
            Some(upstream) if upstream == local => false,
            Some(upstream) => {
                let (ahead, behind) = self.git().ahead_behind(&local, &upstream)?;
                debug!(%branch, ahead, behind, "push check");
                ahead > 0 && behind == 0
            }
        };

        if !should_push {
            return Ok(PushOutcome::NothingToPush);
        }

        let refspec = push_refspec(branch);
        self.git().push(remote, &refspec)?;
        self.git().set_ref(
            tracking_ref.as_str(),
            &local,
            &format!("quire: pushed {}", local.short(7)),
        )?;
        Ok(PushOutcome::Pushed { refspec })
    }
}

/// Sync the repository containing `repo_root`.
pub fn sync_repository(repo_root: &Path, options: &SyncOptions) -> Result<SyncResult, QuireError> {
    Workspace::open(repo_root)?.sync_repository(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid() -> Oid {
        Oid::new("4444444444444444444444444444444444444444").unwrap()
    }

    mod status {
        use super::*;

        fn pushed() -> PushOutcome {
            PushOutcome::Pushed {
                refspec: "refs/heads/main:refs/heads/main".into(),
            }
        }

        #[test]
        fn up_to_date_needs_no_push() {
            assert_eq!(
                SyncStatus::derive(&IntegrationOutcome::UpToDate, &PushOutcome::NothingToPush),
                SyncStatus::UpToDate
            );
            assert_eq!(
                SyncStatus::derive(&IntegrationOutcome::UpToDate, &PushOutcome::Skipped),
                SyncStatus::UpToDate
            );
        }

        #[test]
        fn any_push_is_pushed() {
            for integration in [
                IntegrationOutcome::NoRemoteBranch,
                IntegrationOutcome::LocalAhead,
                IntegrationOutcome::Merged { commit: oid() },
            ] {
                assert_eq!(
                    SyncStatus::derive(&integration, &pushed()),
                    SyncStatus::Pushed
                );
            }
        }

        #[test]
        fn fast_forward_without_push_is_integrated() {
            assert_eq!(
                SyncStatus::derive(
                    &IntegrationOutcome::FastForwarded { commit: oid() },
                    &PushOutcome::NothingToPush
                ),
                SyncStatus::Integrated
            );
        }

        #[test]
        fn skipped_push_with_changes_is_local_only() {
            assert_eq!(
                SyncStatus::derive(&IntegrationOutcome::LocalAhead, &PushOutcome::Skipped),
                SyncStatus::LocalOnly
            );
        }
    }

    #[test]
    fn refspec_maps_branch_to_same_name() {
        let branch = BranchName::new("drafts/ch1").unwrap();
        assert_eq!(
            push_refspec(&branch),
            "refs/heads/drafts/ch1:refs/heads/drafts/ch1"
        );
    }

    #[test]
    fn result_serializes_stage_tags() {
        let result = SyncResult {
            branch: BranchName::new("main").unwrap(),
            remote: "origin".into(),
            fetch: FetchSummary::default(),
            integration: IntegrationOutcome::NoRemoteBranch,
            push: PushOutcome::NothingToPush,
            status: SyncStatus::Integrated,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["integration"]["status"], "no_remote_branch");
        assert_eq!(json["push"]["status"], "nothing_to_push");
        assert_eq!(json["status"], "integrated");
    }
}
