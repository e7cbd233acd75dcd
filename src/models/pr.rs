use std::fmt;

use serde::{Deserialize, Serialize};

// ── Keys ──────────────────────────────────────────────────────

/// Stable identifier of a pull request, rendered as `<owner>/<repo>#<number>`.
///
/// The rendered string is the identity: two keys are equal iff their
/// renderings are equal, and ordering is plain string ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PullRequestKey(String);

impl PullRequestKey {
    pub fn new(repository_full_name: &str, number: u64) -> Self {
        Self(format!("{}#{}", repository_full_name, number))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PullRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PullRequestKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Review status ─────────────────────────────────────────────

/// Aggregate review decision as reported by the platform.
///
/// Kept as an opaque string: anything other than `APPROVED` counts as
/// "not approved", and unknown values round-trip through the state file untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewStatus(String);

impl ReviewStatus {
    pub const APPROVED: &'static str = "APPROVED";
    pub const REVIEW_REQUIRED: &'static str = "REVIEW_REQUIRED";
    pub const CHANGES_REQUESTED: &'static str = "CHANGES_REQUESTED";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn approved() -> Self {
        Self(Self::APPROVED.to_string())
    }

    /// The empty status: no review rule is configured for the branch.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_approved(&self) -> bool {
        self.0 == Self::APPROVED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&str> for ReviewStatus {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Pull request ──────────────────────────────────────────────

/// An open pull request as listed by the PR source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    /// Fully qualified repository name, e.g. "octo/widgets".
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub url: String,
}

impl PullRequest {
    pub fn key(&self) -> PullRequestKey {
        PullRequestKey::new(&self.repository, self.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_renders_owner_repo_and_number() {
        let key = PullRequestKey::new("envato/repo", 123);
        assert_eq!(key.as_str(), "envato/repo#123");
        assert_eq!(key.to_string(), "envato/repo#123");
    }

    #[test]
    fn test_keys_equal_iff_renderings_equal() {
        assert_eq!(PullRequestKey::new("a/b", 1), PullRequestKey::from("a/b#1"));
        assert_ne!(PullRequestKey::new("a/b", 1), PullRequestKey::new("a/b", 11));
    }

    #[test]
    fn test_keys_order_by_string_form() {
        let mut keys = vec![
            PullRequestKey::new("org/repo", 2),
            PullRequestKey::new("org/repo", 10),
            PullRequestKey::new("alpha/x", 99),
        ];
        keys.sort();
        let rendered: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(rendered, vec!["alpha/x#99", "org/repo#10", "org/repo#2"]);
    }

    #[test]
    fn test_only_approved_counts_as_approved() {
        assert!(ReviewStatus::approved().is_approved());
        assert!(!ReviewStatus::from(ReviewStatus::REVIEW_REQUIRED).is_approved());
        assert!(!ReviewStatus::from(ReviewStatus::CHANGES_REQUESTED).is_approved());
        assert!(!ReviewStatus::none().is_approved());
        assert!(!ReviewStatus::from("approved").is_approved());
    }

    #[test]
    fn test_pull_request_key_uses_repository_full_name() {
        let pr = PullRequest {
            repository: "octo/widgets".into(),
            number: 7,
            title: "Add sprockets".into(),
            url: "https://github.com/octo/widgets/pull/7".into(),
        };
        assert_eq!(pr.key().as_str(), "octo/widgets#7");
    }
}
