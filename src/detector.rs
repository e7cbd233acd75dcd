//! Approval-transition detection.
//!
//! Compares the previous snapshot with the statuses fetched this cycle and
//! reports every key that is `APPROVED` now but was not before. Keys that only
//! exist in the previous snapshot (closed or merged PRs) are ignored.

use std::collections::BTreeSet;

use crate::models::{PullRequestKey, StateSnapshot};

/// How to treat an approved PR that has never been seen before.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FirstSighting {
    /// Notify: the tool cannot tell "just approved" from "approved before we
    /// started", so it errs towards over-notifying.
    #[default]
    Notify,
    /// Stay quiet unless the key was present in the previous snapshot with a
    /// non-approved status.
    Skip,
}

/// Keys that moved to `APPROVED`, using the default first-sighting policy.
pub fn detect(previous: &StateSnapshot, current: &StateSnapshot) -> BTreeSet<PullRequestKey> {
    detect_with(FirstSighting::default(), previous, current)
}

/// Keys that moved to `APPROVED`, ordered by key string.
pub fn detect_with(
    policy: FirstSighting,
    previous: &StateSnapshot,
    current: &StateSnapshot,
) -> BTreeSet<PullRequestKey> {
    current
        .iter()
        .filter(|(_, status)| status.is_approved())
        .filter(|(key, _)| match previous.get(*key) {
            Some(prev) => !prev.is_approved(),
            None => policy == FirstSighting::Notify,
        })
        .map(|(key, _)| key.clone())
        .collect()
}
