//! PR source backed by the GitHub CLI (`gh`).
//!
//! Authentication is whatever `gh auth login` set up; this module never sees
//! a token.

use std::ffi::OsString;
use std::process::Stdio;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::PrSource;
use crate::errors::FetchError;
use crate::models::{PullRequest, ReviewStatus};

const DEFAULT_PROGRAM: &str = "gh";
const DEFAULT_AUTHOR: &str = "@me";

#[derive(Debug, Clone)]
pub struct GhCli {
    program: OsString,
    author: String,
}

impl GhCli {
    pub fn new() -> Self {
        Self {
            program: DEFAULT_PROGRAM.into(),
            author: DEFAULT_AUTHOR.to_string(),
        }
    }

    /// Use a different `gh` executable.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// List PRs by `author` instead of the authenticated user.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    /// Startup precondition: `gh` is installed and logged in.
    pub async fn preflight(&self) -> anyhow::Result<()> {
        let installed = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false);
        if !installed {
            anyhow::bail!(
                "gh CLI not found in PATH - install it from https://cli.github.com (e.g. brew install gh)"
            );
        }

        let status = Command::new(&self.program)
            .args(["auth", "status"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .context("failed to run `gh auth status`")?;
        if !status.success() {
            anyhow::bail!("gh not authenticated - run: gh auth login");
        }

        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, FetchError> {
        let command = format!("gh {}", args.join(" "));
        tracing::debug!(command = %command, "running gh");

        let output = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| FetchError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(FetchError::Command {
                command,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl Default for GhCli {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrSource for GhCli {
    async fn list_open(&self) -> Result<Vec<PullRequest>, FetchError> {
        let args = [
            "search",
            "prs",
            "--author",
            self.author.as_str(),
            "--state",
            "open",
            "--json",
            "number,title,url,repository",
        ];
        let out = self.run(&args).await?;
        parse_pull_requests(&out).map_err(|source| FetchError::Parse {
            command: "gh search prs".to_string(),
            source,
        })
    }

    async fn review_status(
        &self,
        repository: &str,
        number: u64,
    ) -> Result<ReviewStatus, FetchError> {
        let number = number.to_string();
        let args = [
            "pr",
            "view",
            number.as_str(),
            "--repo",
            repository,
            "--json",
            "reviewDecision",
        ];
        let out = self.run(&args).await?;
        parse_review_decision(&out).map_err(|source| FetchError::Parse {
            command: format!("gh pr view {} --repo {}", number, repository),
            source,
        })
    }
}

// ── Output decoding ───────────────────────────────────────────

#[derive(Deserialize)]
struct SearchItem {
    number: u64,
    title: String,
    url: String,
    repository: SearchRepository,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRepository {
    name_with_owner: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewDecision {
    #[serde(default)]
    review_decision: Option<String>,
}

pub(crate) fn parse_pull_requests(out: &[u8]) -> Result<Vec<PullRequest>, serde_json::Error> {
    let items: Vec<SearchItem> = serde_json::from_slice(out)?;
    Ok(items
        .into_iter()
        .map(|item| PullRequest {
            repository: item.repository.name_with_owner,
            number: item.number,
            title: item.title,
            url: item.url,
        })
        .collect())
}

pub(crate) fn parse_review_decision(out: &[u8]) -> Result<ReviewStatus, serde_json::Error> {
    let rd: ReviewDecision = serde_json::from_slice(out)?;
    Ok(ReviewStatus::new(rd.review_decision.unwrap_or_default()))
}
