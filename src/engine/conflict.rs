//! engine::conflict
//!
//! The set of paths a merge left in conflict.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Conflicting paths, sorted and deduplicated.
///
/// A path appears once however many index stages (ancestor, ours, theirs)
/// it has, so the set is the same whichever side was "ours".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConflictSet(Vec<String>);

impl ConflictSet {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let unique: BTreeSet<String> = paths.into_iter().map(Into::into).collect();
        Self(unique.into_iter().collect())
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.binary_search_by(|p| p.as_str().cmp(path)).is_ok()
    }
}

impl fmt::Display for ConflictSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}
