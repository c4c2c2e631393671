//! core::types
//!
//! Strong types for the values that cross the porcelain boundary.
//!
//! # Types
//!
//! - [`BranchName`] - Validated branch name (local or remote-tracking shorthand)
//! - [`Oid`] - Commit identifier (hex SHA)
//! - [`RefName`] - Fully qualified reference name
//!
//! Construction validates; an invalid value cannot be represented.
//!
//! # Examples
//!
//! ```
//! use quire::core::types::{BranchName, Oid, RefName};
//!
//! let branch = BranchName::new("drafts/chapter-1").unwrap();
//! assert_eq!(RefName::for_branch(&branch).as_str(), "refs/heads/drafts/chapter-1");
//!
//! assert!(BranchName::new("bad..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid ref name: {0}")]
    InvalidRefName(String),
}

/// Characters git refuses anywhere in a refname.
const FORBIDDEN_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

/// Check the refname rules shared by branch names and full ref names
/// (`git check-ref-format`). Returns a description of the first violation.
fn check_ref_format(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("cannot be empty".into());
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err("cannot start or end with '/'".into());
    }
    if name.ends_with('.') {
        return Err("cannot end with '.'".into());
    }
    for bad in ["..", "@{", "//"] {
        if name.contains(bad) {
            return Err(format!("cannot contain '{bad}'"));
        }
    }
    if let Some(c) = name.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(format!("cannot contain '{c}'"));
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return Err("cannot contain control characters".into());
    }
    for component in name.split('/') {
        if component.starts_with('.') {
            return Err(format!("component '{component}' cannot start with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(format!("component '{component}' cannot end with '.lock'"));
        }
    }
    Ok(())
}

/// A validated branch name.
///
/// Besides the general refname rules a branch name cannot be `@`, and cannot
/// start with `-` (it would read as a command-line flag).
///
/// Remote-tracking shorthands such as `origin/topic` are valid branch names
/// too; the namespace they live in is decided by [`RefName`].
///
/// ```
/// use quire::core::types::BranchName;
///
/// assert!(BranchName::new("origin/feature/x").is_ok());
/// assert!(BranchName::new("@").is_err());
/// assert!(BranchName::new("-f").is_err());
/// assert!(BranchName::new("notes.lock").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name == "@" {
            return Err(TypeError::InvalidBranchName("'@' is reserved".into()));
        }
        if name.starts_with('-') {
            return Err(TypeError::InvalidBranchName(format!(
                "'{name}' cannot start with '-'"
            )));
        }
        check_ref_format(&name)
            .map_err(|why| TypeError::InvalidBranchName(format!("'{name}' {why}")))?;
        Ok(Self(name))
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commit identifier, normalized to lowercase hex.
///
/// Both SHA-1 (40 chars) and SHA-256 (64 chars) object formats are accepted.
///
/// ```
/// use quire::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64 character hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(format!("'{oid}' is not hexadecimal")));
        }
        Ok(Self(oid))
    }

    /// Abbreviated form: the first `len` characters (or the whole id).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const HEADS_PREFIX: &str = "refs/heads/";
const REMOTES_PREFIX: &str = "refs/remotes/";

/// A fully qualified reference name (`refs/heads/...`, `refs/remotes/...`).
///
/// ```
/// use quire::core::types::{BranchName, RefName};
///
/// let topic = BranchName::new("topic").unwrap();
/// let tracking = RefName::for_remote_branch("origin", &topic);
/// assert_eq!(tracking.as_str(), "refs/remotes/origin/topic");
/// assert_eq!(tracking.remote_shorthand(), Some("origin/topic"));
/// assert!(tracking.is_remote_ref());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RefName(String);

impl RefName {
    /// Create a new validated ref name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRefName` if the name violates git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        check_ref_format(&name)
            .map_err(|why| TypeError::InvalidRefName(format!("'{name}' {why}")))?;
        Ok(Self(name))
    }

    /// `refs/heads/<branch>`.
    pub fn for_branch(branch: &BranchName) -> Self {
        Self(format!("{HEADS_PREFIX}{branch}"))
    }

    /// `refs/remotes/<remote>/<branch>`.
    pub fn for_remote_branch(remote: &str, branch: &BranchName) -> Self {
        Self(format!("{REMOTES_PREFIX}{remote}/{branch}"))
    }

    /// `refs/remotes/<shorthand>`, for a shorthand like `origin/topic`.
    pub fn for_remote_shorthand(shorthand: &BranchName) -> Self {
        Self(format!("{REMOTES_PREFIX}{shorthand}"))
    }

    /// Strip a prefix from the ref name and return the remainder.
    pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
        self.0.strip_prefix(prefix)
    }

    /// Whether this ref lives under `refs/heads/`.
    pub fn is_branch_ref(&self) -> bool {
        self.0.starts_with(HEADS_PREFIX)
    }

    /// Whether this ref lives under `refs/remotes/`.
    pub fn is_remote_ref(&self) -> bool {
        self.0.starts_with(REMOTES_PREFIX)
    }

    /// The local branch name for a `refs/heads/` ref.
    pub fn branch_shorthand(&self) -> Option<&str> {
        self.strip_prefix(HEADS_PREFIX)
    }

    /// The `<remote>/<branch>` shorthand for a `refs/remotes/` ref.
    pub fn remote_shorthand(&self) -> Option<&str> {
        self.strip_prefix(REMOTES_PREFIX)
    }

    /// Get the ref name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RefName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RefName> for String {
    fn from(name: RefName) -> Self {
        name.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
