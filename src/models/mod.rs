pub mod pr;
pub mod snapshot;

pub use pr::{PullRequest, PullRequestKey, ReviewStatus};
pub use snapshot::StateSnapshot;
