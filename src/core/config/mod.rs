//! core::config
//!
//! Configuration schema and loading.
//!
//! # Scopes
//!
//! - **Global**: user-level identity and sync defaults
//! - **Repo**: per-repository overrides, stored inside the git directory
//!
//! # Precedence
//!
//! Later overrides earlier:
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$QUIRE_CONFIG`
//! 2. `$XDG_CONFIG_HOME/quire/config.toml`
//! 3. `~/.quire/config.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<git-dir>/quire/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use quire::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! println!("Remote: {}", config.remote());
//! println!("Push after sync: {}", config.push());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, Identity, RepoConfig, SyncDefaults};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Default remote when nothing is configured.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules: repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if one was found)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// `git_dir` is the repository's git directory; when given, the repo
    /// config inside it is loaded too. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load(git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_from(&Self::global_candidates(), git_dir)
    }

    /// Load configuration using an explicit list of global config candidates.
    ///
    /// The first candidate that exists is used.
    pub fn load_from(global_candidates: &[PathBuf], git_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let (global, global_path) = match global_candidates.iter().find(|p| p.exists()) {
            Some(path) => (read_toml::<GlobalConfig>(path)?, Some(path.clone())),
            None => (GlobalConfig::default(), None),
        };
        global.validate()?;

        let (repo, repo_path) = match git_dir.map(Self::repo_config_path) {
            Some(path) if path.exists() => {
                let repo = read_toml::<RepoConfig>(&path)?;
                repo.validate()?;
                (Some(repo), Some(path))
            }
            _ => (None, None),
        };

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Global config search list, in precedence order.
    fn global_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(path) = std::env::var("QUIRE_CONFIG") {
            candidates.push(PathBuf::from(path));
        }
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            candidates.push(PathBuf::from(xdg_home).join("quire/config.toml"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".quire/config.toml"));
        }
        candidates
    }

    /// Canonical path for repo config inside a git directory.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("quire/config.toml")
    }

    // =========================================================================
    // Accessors with precedence
    // =========================================================================

    /// Remote to sync with. Defaults to `origin`.
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .or_else(|| self.global.sync.as_ref().and_then(|s| s.remote.as_deref()))
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Whether sync pushes after integrating. Defaults to `true`.
    pub fn push(&self) -> bool {
        self.repo
            .as_ref()
            .and_then(|r| r.push)
            .or_else(|| self.global.sync.as_ref().and_then(|s| s.push))
            .unwrap_or(true)
    }

    /// Configured `(name, email)` identity, if complete.
    pub fn identity(&self) -> Option<(&str, &str)> {
        self.global.identity.as_ref().and_then(Identity::complete)
    }

    /// Path the global config was loaded from.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path the repo config was loaded from.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn git_dir_with_repo_config(temp: &TempDir, contents: &str) -> PathBuf {
        let git_dir = temp.path().join(".git");
        fs::create_dir_all(git_dir.join("quire")).unwrap();
        fs::write(git_dir.join("quire/config.toml"), contents).unwrap();
        git_dir
    }

    #[test]
    fn defaults_without_files() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_from(&[temp.path().join("missing.toml")], None).unwrap();

        assert_eq!(config.remote(), "origin");
        assert!(config.push());
        assert!(config.identity().is_none());
        assert!(config.global_config_loaded_from().is_none());
    }

    #[test]
    fn first_existing_global_candidate_wins() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first.toml");
        let second = temp.path().join("second.toml");
        fs::write(&second, "[sync]\nremote = \"second\"\n").unwrap();

        let config = Config::load_from(&[first, second.clone()], None).unwrap();
        assert_eq!(config.remote(), "second");
        assert_eq!(config.global_config_loaded_from(), Some(second.as_path()));
    }

    #[test]
    fn repo_overrides_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "[sync]\nremote = \"upstream\"\npush = true\n").unwrap();
        let git_dir = git_dir_with_repo_config(&temp, "remote = \"backup\"\npush = false\n");

        let config = Config::load_from(&[global], Some(&git_dir)).unwrap();
        assert_eq!(config.remote(), "backup");
        assert!(!config.push());
        assert!(config.repo_config_loaded_from().is_some());
    }

    #[test]
    fn identity_from_global() {
        let temp = TempDir::new().unwrap();
        let global = temp.path().join("global.toml");
        fs::write(&global, "[identity]\nname = \"Ada\"\nemail = \"ada@example.com\"\n").unwrap();

        let config = Config::load_from(&[global], None).unwrap();
        assert_eq!(config.identity(), Some(("Ada", "ada@example.com")));
    }

    #[test]
    fn parse_error_names_file() {
        let temp = TempDir::new().unwrap();
        let git_dir = git_dir_with_repo_config(&temp, "remote = [");

        let err = Config::load_from(&[], Some(&git_dir)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn invalid_repo_value_rejected() {
        let temp = TempDir::new().unwrap();
        let git_dir = git_dir_with_repo_config(&temp, "remote = \"\"\n");

        let err = Config::load_from(&[], Some(&git_dir)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }
}
