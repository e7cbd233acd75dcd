use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pr::{PullRequestKey, ReviewStatus};

/// Last known review status of every open PR, keyed by `PullRequestKey`.
///
/// Backed by a `BTreeMap` so iteration and serialization are ordered by the
/// key's string form; saving the same logical snapshot twice yields the same
/// bytes. Snapshots are built whole (see `FromIterator`) and replaced rather
/// than edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot {
    entries: BTreeMap<PullRequestKey, ReviewStatus>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &PullRequestKey) -> Option<&ReviewStatus> {
        self.entries.get(key)
    }

    /// Absent keys are "not approved".
    pub fn is_approved(&self, key: &PullRequestKey) -> bool {
        self.get(key).is_some_and(ReviewStatus::is_approved)
    }

    pub fn contains(&self, key: &PullRequestKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PullRequestKey, &ReviewStatus)> {
        self.entries.iter()
    }
}

impl FromIterator<(PullRequestKey, ReviewStatus)> for StateSnapshot {
    fn from_iter<I: IntoIterator<Item = (PullRequestKey, ReviewStatus)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for StateSnapshot {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs
            .into_iter()
            .map(|(k, v)| (PullRequestKey::from(k), ReviewStatus::from(v)))
            .collect()
    }
}
