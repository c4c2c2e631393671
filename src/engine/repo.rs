//! engine::repo
//!
//! Repository handle resolution.
//!
//! [`Workspace`] pairs the backend handle with the loaded configuration.
//! Every porcelain operation starts here: the handle is discovered from any
//! directory inside the working tree, bare repositories are rejected, and
//! operations that need a commit ask for one through
//! [`Workspace::require_commits`].

use std::path::Path;

use tracing::debug;

use crate::core::config::Config;
use crate::core::types::{BranchName, Oid};
use crate::git::{CheckoutMode, Git, GitError, HeadState};

use super::error::QuireError;

/// An opened, non-bare repository and its configuration.
#[derive(Debug)]
pub struct Workspace {
    git: Git,
    config: Config,
}

/// Open the repository containing `repo_root`.
///
/// # Errors
///
/// - [`QuireError::RepositoryNotFound`] if no repository is found
/// - [`QuireError::UnsupportedOperation`] for a bare repository
/// - [`QuireError::Config`] if a config file is malformed
pub fn open_repository(repo_root: &Path) -> Result<Workspace, QuireError> {
    Workspace::open(repo_root)
}

impl Workspace {
    /// Discover the repository and load global and repo configuration.
    pub fn open(path: &Path) -> Result<Self, QuireError> {
        let git = Git::open(path)?;
        let config = Config::load(Some(git.git_dir()))?;
        debug!(
            git_dir = %git.git_dir().display(),
            global_config = ?config.global_config_loaded_from(),
            repo_config = ?config.repo_config_loaded_from(),
            "opened repository"
        );
        Ok(Self { git, config })
    }

    /// Discover the repository but use the given configuration.
    pub fn with_config(path: &Path, config: Config) -> Result<Self, QuireError> {
        let git = Git::open(path)?;
        Ok(Self { git, config })
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// HEAD, provided it points at a commit.
    ///
    /// # Errors
    ///
    /// - [`QuireError::RepositoryEmpty`] if HEAD is unborn
    pub fn require_commits(&self) -> Result<HeadState, QuireError> {
        match self.git.head()? {
            HeadState::Unborn { .. } => Err(QuireError::RepositoryEmpty),
            head => Ok(head),
        }
    }

    /// The checked-out branch and its tip.
    ///
    /// # Errors
    ///
    /// - [`QuireError::RepositoryEmpty`] if HEAD is unborn
    /// - [`QuireError::DetachedHead`] if HEAD is detached
    pub fn require_branch(&self) -> Result<(BranchName, Oid), QuireError> {
        match self.require_commits()? {
            HeadState::Branch { name, oid } => Ok((name, oid)),
            _ => Err(QuireError::DetachedHead),
        }
    }

    /// Safe checkout; local modifications that would be overwritten become
    /// [`QuireError::CheckoutConflict`] naming `target`.
    pub(crate) fn checkout_safely(&self, oid: &Oid, target: &str) -> Result<(), QuireError> {
        match self.git.checkout_commit(oid, CheckoutMode::Safe) {
            Ok(()) => Ok(()),
            Err(GitError::CheckoutConflict { message }) => {
                debug!(target, %message, "checkout refused");
                Err(QuireError::CheckoutConflict {
                    target: target.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse a user-supplied branch name.
pub(crate) fn parse_branch_name(name: &str) -> Result<BranchName, QuireError> {
    BranchName::new(name).map_err(|_| QuireError::InvalidBranchName(name.to_string()))
}
