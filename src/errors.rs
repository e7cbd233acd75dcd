use std::path::PathBuf;

use thiserror::Error;

/// PR-source listing or status lookup failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Command {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not parse output of `{command}`: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// State Store failures.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state file {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("state file {} could not be read: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist state to {} ({step}): {source}", .path.display())]
    Persist {
        path: PathBuf,
        step: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// A single notifier failed to deliver.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("api rejected notification: {code} {message}")]
    Rejected { code: i64, message: String },

    #[error("`{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("delivery failed for {failed} of {total} endpoint(s)")]
    Partial { failed: usize, total: usize },
}

/// Reasons a poll cycle aborts. Per-PR lookup and notifier failures are not
/// here: they are counted in the cycle summary instead.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("fetching open pull requests failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    State(#[from] StateError),
}
