//! One poll cycle: fetch → load → diff → notify → persist.
//!
//! Ordering within a cycle is strict: the previous snapshot is loaded before
//! detection, every notification attempt finishes before the new snapshot is
//! saved. A key is recorded as `APPROVED` even if every notifier failed for
//! it, so each transition is delivered at most once.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::detector::{detect_with, FirstSighting};
use crate::errors::{CycleError, FetchError};
use crate::models::{PullRequest, PullRequestKey, ReviewStatus, StateSnapshot};
use crate::notification::{Notification, Notifier};
use crate::source::PrSource;
use crate::store::StateFile;

/// Outcome of a completed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// Open PRs returned by the source.
    pub total_prs: usize,
    /// Keys that transitioned to approved this cycle.
    pub new_approvals: usize,
    /// Per-PR status lookups that failed and were left out of the snapshot.
    pub failed_lookups: usize,
    /// Individual notifier deliveries that failed.
    pub failed_deliveries: usize,
}

/// Everything a cycle needs. The state location is explicit so tests can
/// point it at a temp dir.
pub struct Poller {
    store: StateFile,
    source: Arc<dyn PrSource>,
    notifiers: Vec<Arc<dyn Notifier>>,
    first_sighting: FirstSighting,
    lookup_concurrency: usize,
}

impl Poller {
    pub fn new(
        store: StateFile,
        source: Arc<dyn PrSource>,
        notifiers: Vec<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            store,
            source,
            notifiers,
            first_sighting: FirstSighting::default(),
            lookup_concurrency: 1,
        }
    }

    pub fn with_first_sighting(mut self, policy: FirstSighting) -> Self {
        self.first_sighting = policy;
        self
    }

    pub fn with_lookup_concurrency(mut self, n: usize) -> Self {
        self.lookup_concurrency = n.max(1);
        self
    }

    /// Run one cycle. Listing or state failures abort before anything is
    /// written; lookup and notifier failures are counted and skipped.
    pub async fn run_cycle(&self) -> Result<CycleSummary, CycleError> {
        let prs = self.source.list_open().await?;
        let previous = self.store.load()?;

        let mut summary = CycleSummary {
            total_prs: prs.len(),
            ..CycleSummary::default()
        };

        let looked_up = self.lookup_statuses(&prs).await;
        let mut resolved = Vec::with_capacity(looked_up.len());
        for (pr, result) in looked_up {
            match result {
                Ok(status) => resolved.push((pr, status)),
                Err(e) => {
                    summary.failed_lookups += 1;
                    warn!(key = %pr.key(), error = %e, "review status lookup failed, skipping");
                }
            }
        }

        let current: StateSnapshot = resolved
            .iter()
            .map(|(pr, status)| (pr.key(), status.clone()))
            .collect();
        let by_key: BTreeMap<PullRequestKey, &PullRequest> =
            resolved.iter().map(|(pr, _)| (pr.key(), *pr)).collect();

        let approvals = detect_with(self.first_sighting, &previous, &current);
        summary.new_approvals = approvals.len();

        for pr in approvals.iter().filter_map(|key| by_key.get(key)) {
            info!(key = %pr.key(), title = %pr.title, "APPROVED");
            summary.failed_deliveries += self.notify(pr).await;
        }

        self.store.save(&current)?;

        info!(
            total_prs = summary.total_prs,
            new_approvals = summary.new_approvals,
            failed_lookups = summary.failed_lookups,
            "poll complete: {} PRs, {} new approvals",
            summary.total_prs,
            summary.new_approvals
        );
        Ok(summary)
    }

    /// Look up each PR's status, at most `lookup_concurrency` at a time.
    /// Results keep the listing order.
    async fn lookup_statuses<'a>(
        &self,
        prs: &'a [PullRequest],
    ) -> Vec<(&'a PullRequest, Result<ReviewStatus, FetchError>)> {
        stream::iter(prs)
            .map(|pr| async move {
                let result = self.source.review_status(&pr.repository, pr.number).await;
                (pr, result)
            })
            .buffered(self.lookup_concurrency)
            .collect()
            .await
    }

    /// Deliver through every notifier. Returns the number of failures.
    async fn notify(&self, pr: &PullRequest) -> usize {
        let notification = Notification::approved(pr);
        let mut failures = 0;
        for notifier in &self.notifiers {
            match notifier.deliver(&notification).await {
                Ok(()) => debug!(key = %notification.subtitle, notifier = notifier.name(), "notification delivered"),
                Err(e) => {
                    failures += 1;
                    warn!(
                        key = %notification.subtitle,
                        notifier = notifier.name(),
                        error = %e,
                        "notification failed"
                    );
                }
            }
        }
        failures
    }
}
