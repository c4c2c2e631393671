//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! ```toml
//! [identity]
//! name = "Ada Writer"
//! email = "ada@example.com"
//!
//! [sync]
//! remote = "origin"
//! push = true
//! ```
//!
//! # Repo Config
//!
//! ```toml
//! remote = "backup"
//! push = false
//! ```
//!
//! Values are validated after parsing.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Author/committer identity used when git has none configured
    pub identity: Option<Identity>,

    /// Sync defaults
    pub sync: Option<SyncDefaults>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(identity) = &self.identity {
            identity.validate()?;
        }
        if let Some(sync) = &self.sync {
            validate_remote(sync.remote.as_deref())?;
        }
        Ok(())
    }
}

/// Repository configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Remote to sync with
    pub remote: Option<String>,

    /// Whether sync pushes after integrating
    pub push: Option<bool>,
}

impl RepoConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_remote(self.remote.as_deref())
    }
}

/// A configured author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// Both fields, if both are present and non-blank.
    pub fn complete(&self) -> Option<(&str, &str)> {
        let name = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let email = self.email.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((name, email))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.complete().is_none() {
            return Err(ConfigError::InvalidValue(
                "identity requires both a name and an email".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sync command defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SyncDefaults {
    /// Default remote name
    pub remote: Option<String>,

    /// Push after integrating
    pub push: Option<bool>,
}

fn validate_remote(remote: Option<&str>) -> Result<(), ConfigError> {
    match remote {
        Some(r) if r.trim().is_empty() => Err(ConfigError::InvalidValue(
            "remote cannot be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.identity.is_none());
            assert!(config.sync.is_none());
            assert!(config.validate().is_ok());
        }

        #[test]
        fn partial_identity_rejected() {
            let config = GlobalConfig {
                identity: Some(Identity {
                    name: Some("Ada".into()),
                    email: None,
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn blank_sync_remote_rejected() {
            let config = GlobalConfig {
                sync: Some(SyncDefaults {
                    remote: Some("  ".into()),
                    push: None,
                }),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn parses_toml() {
            let parsed: GlobalConfig = toml::from_str(
                "[identity]\nname = \"Ada\"\nemail = \"ada@example.com\"\n\n[sync]\npush = false\n",
            )
            .unwrap();
            assert_eq!(
                parsed.identity.as_ref().and_then(Identity::complete),
                Some(("Ada", "ada@example.com"))
            );
            assert_eq!(parsed.sync.and_then(|s| s.push), Some(false));
        }

        #[test]
        fn unknown_fields_rejected() {
            let parsed: Result<GlobalConfig, _> = toml::from_str("colour = \"blue\"\n");
            assert!(parsed.is_err());
        }
    }

    mod repo_config {
        use super::*;

        #[test]
        fn empty_remote_rejected() {
            let config = RepoConfig {
                remote: Some(String::new()),
                push: None,
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn valid_remote() {
            let config = RepoConfig {
                remote: Some("backup".into()),
                push: Some(true),
            };
            assert!(config.validate().is_ok());
        }
    }
}
