//! engine::error
//!
//! The error taxonomy every porcelain operation reports.
//!
//! Each variant renders as one sentence. [`QuireError::MergeConflict`]
//! additionally lists every conflicting path, and [`QuireError::PushError`]
//! appends an advisory hint when the failure text suggests one.

use serde::Serialize;
use thiserror::Error;

use crate::core::config::ConfigError;
use crate::git::{GitError, GitState};

use super::conflict::ConflictSet;

/// Advisory follow-up attached to a failed push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PushHint {
    /// The remote has commits the local branch lacks.
    NonFastForward,
    /// The remote refused our credentials.
    Authentication,
}

impl PushHint {
    /// Pick a hint from the transport's failure message, if any applies.
    ///
    /// ```
    /// use quire::engine::PushHint;
    ///
    /// assert_eq!(
    ///     PushHint::from_failure("! [rejected] main -> main (non-fast-forward)"),
    ///     Some(PushHint::NonFastForward)
    /// );
    /// assert_eq!(PushHint::from_failure("connection reset"), None);
    /// ```
    pub fn from_failure(message: &str) -> Option<Self> {
        let lower = message.to_ascii_lowercase();
        if [
            "non-fast-forward",
            "non-fastforward",
            "fetch first",
            "not present locally",
            "stale info",
        ]
        .iter()
            .any(|needle| lower.contains(needle))
        {
            Some(PushHint::NonFastForward)
        } else if ["authentication", "credentials", "permission denied", "401", "403"]
            .iter()
            .any(|needle| lower.contains(needle))
        {
            Some(PushHint::Authentication)
        } else {
            None
        }
    }

    /// The advisory sentence shown to the user.
    pub fn advice(&self) -> &'static str {
        match self {
            PushHint::NonFastForward => {
                "The remote has changes you don't have; sync again to integrate them before pushing."
            }
            PushHint::Authentication => {
                "Check your credentials (ssh-agent or credential helper) for this remote."
            }
        }
    }
}

/// Backend messages sometimes end in a period; the sentence adds its own.
fn sentence_body(message: String) -> String {
    message.trim_end().trim_end_matches('.').to_string()
}

fn hint_suffix(hint: &Option<PushHint>) -> String {
    hint.map(|h| format!(" {}", h.advice())).unwrap_or_default()
}

/// Errors from porcelain operations.
#[derive(Debug, Error)]
pub enum QuireError {
    /// No repository at or above the given path.
    #[error("No repository found at or above {path}.")]
    RepositoryNotFound { path: String },

    /// Bare repositories, or an option combination that isn't supported.
    #[error("Unsupported operation: {0}.")]
    UnsupportedOperation(String),

    /// HEAD is unborn where a commit is required.
    #[error("The repository has no commits yet.")]
    RepositoryEmpty,

    #[error("A branch named '{0}' already exists.")]
    BranchAlreadyExists(String),

    #[error("No local or remote branch named '{0}' was found.")]
    BranchNotFound(String),

    #[error("'{0}' is not a valid branch name.")]
    InvalidBranchName(String),

    /// The operation needs a named current branch.
    #[error("HEAD is detached; check out a branch first.")]
    DetachedHead,

    /// Checkout would overwrite uncommitted changes; nothing was touched.
    #[error("Checking out '{target}' would overwrite uncommitted local changes.")]
    CheckoutConflict { target: String },

    /// Three-way integration left conflicts in the index.
    #[error("Merge conflict in {0}.")]
    MergeConflict(ConflictSet),

    /// A merge/revert/cherry-pick/rebase marker is present.
    #[error("A {0} is in progress; finish or abort it first.")]
    OperationInProgress(GitState),

    #[error("No author identity is configured; set user.name and user.email.")]
    SignatureNotConfigured,

    #[error("Remote '{0}' is not configured.")]
    RemoteNotFound(String),

    #[error("Fetching from '{remote}' failed: {message}.")]
    FetchError { remote: String, message: String },

    #[error("Pushing to '{remote}' failed: {message}.{}", hint_suffix(.hint))]
    PushError {
        remote: String,
        message: String,
        hint: Option<PushHint>,
    },

    #[error("Configuration error: {0}.")]
    Config(#[from] ConfigError),

    /// Backend failure not otherwise classified.
    #[error("Git operation failed: {0}.")]
    GenericOperationFailure(String),
}

impl QuireError {
    /// Stable kind name, used for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            QuireError::RepositoryNotFound { .. } => "repository_not_found",
            QuireError::UnsupportedOperation(_) => "unsupported_operation",
            QuireError::RepositoryEmpty => "repository_empty",
            QuireError::BranchAlreadyExists(_) => "branch_already_exists",
            QuireError::BranchNotFound(_) => "branch_not_found",
            QuireError::InvalidBranchName(_) => "invalid_branch_name",
            QuireError::DetachedHead => "detached_head",
            QuireError::CheckoutConflict { .. } => "checkout_conflict",
            QuireError::MergeConflict(_) => "merge_conflict",
            QuireError::OperationInProgress(_) => "operation_in_progress",
            QuireError::SignatureNotConfigured => "signature_not_configured",
            QuireError::RemoteNotFound(_) => "remote_not_found",
            QuireError::FetchError { .. } => "fetch_error",
            QuireError::PushError { .. } => "push_error",
            QuireError::Config(_) => "config",
            QuireError::GenericOperationFailure(_) => "generic_operation_failure",
        }
    }

    /// Conflicting paths, when this is a merge conflict.
    pub fn conflicts(&self) -> Option<&ConflictSet> {
        match self {
            QuireError::MergeConflict(set) => Some(set),
            _ => None,
        }
    }
}

/// Backend errors that reach the caller without a more specific mapping.
impl From<GitError> for QuireError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::NotARepo { path } => QuireError::RepositoryNotFound {
                path: path.display().to_string(),
            },
            GitError::BareRepo => {
                QuireError::UnsupportedOperation("bare repositories have no working tree".into())
            }
            GitError::BranchExists { name } => QuireError::BranchAlreadyExists(name),
            GitError::RemoteNotFound { remote } => QuireError::RemoteNotFound(remote),
            GitError::FetchFailed { remote, message } => QuireError::FetchError {
                remote,
                message: sentence_body(message),
            },
            GitError::PushFailed { remote, message } => QuireError::PushError {
                hint: PushHint::from_failure(&message),
                remote,
                message: sentence_body(message),
            },
            GitError::InvalidRefName { message } => QuireError::InvalidBranchName(message),
            other => QuireError::GenericOperationFailure(sentence_body(other.to_string())),
        }
    }
}
