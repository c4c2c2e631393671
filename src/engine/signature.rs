//! engine::signature
//!
//! Author/committer identity for commits the porcelain creates.
//!
//! Sources, first complete one wins: git configuration, the `[identity]`
//! table of the quire config, then `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL`,
//! then `GIT_COMMITTER_NAME`/`GIT_COMMITTER_EMAIL`.

use tracing::debug;

use crate::core::config::Config;
use crate::git::{Git, Signature};

use super::error::QuireError;

const ENV_PAIRS: [(&str, &str); 2] = [
    ("GIT_AUTHOR_NAME", "GIT_AUTHOR_EMAIL"),
    ("GIT_COMMITTER_NAME", "GIT_COMMITTER_EMAIL"),
];

/// Resolve the identity for a new commit.
///
/// # Errors
///
/// - [`QuireError::SignatureNotConfigured`] when no source is complete
pub fn resolve_signature(git: &Git, config: &Config) -> Result<Signature, QuireError> {
    pick_signature(git.configured_signature(), config.identity(), |key| {
        std::env::var(key).ok()
    })
}

fn pick_signature(
    from_git: Option<Signature>,
    from_config: Option<(&str, &str)>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Signature, QuireError> {
    if let Some(sig) = from_git.filter(is_complete) {
        debug!(source = "git config", "using signature");
        return Ok(sig);
    }
    if let Some((name, email)) = from_config {
        debug!(source = "quire config", "using signature");
        return Ok(Signature::new(name, email));
    }
    for (name_key, email_key) in ENV_PAIRS {
        let sig = env(name_key)
            .zip(env(email_key))
            .map(|(name, email)| Signature::new(name, email));
        if let Some(sig) = sig.filter(is_complete) {
            debug!(source = name_key, "using signature");
            return Ok(sig);
        }
    }
    Err(QuireError::SignatureNotConfigured)
}

fn is_complete(sig: &Signature) -> bool {
    !sig.name.trim().is_empty() && !sig.email.trim().is_empty()
}
