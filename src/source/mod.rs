//! PR sources: where the list of open pull requests and their review
//! decisions come from.

pub mod gh_cli;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{PullRequest, ReviewStatus};

pub use gh_cli::GhCli;

#[async_trait]
pub trait PrSource: Send + Sync {
    /// Open PRs authored by the configured identity.
    async fn list_open(&self) -> Result<Vec<PullRequest>, FetchError>;

    /// Aggregate review decision for one PR.
    async fn review_status(&self, repository: &str, number: u64)
        -> Result<ReviewStatus, FetchError>;
}
