use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

use crate::cli::Cli;
use crate::detector::FirstSighting;

const STATE_DIR_NAME: &str = "gh-pr-notify";
const STATE_FILE_NAME: &str = "state.json";

/// Runtime configuration, resolved and validated from the command line and
/// environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub state_path: PathBuf,
    /// Identity passed to `gh search prs --author`.
    pub author: String,
    pub first_sighting: FirstSighting,
    pub lookup_concurrency: usize,
    pub once: bool,

    pub desktop: bool,
    pub sound: String,
    /// Bark is enabled iff a device key is set.
    pub bark_key: Option<String>,
    pub bark_server: String,
    pub bark_sound: String,
    pub slack_webhook_url: Option<String>,
    pub webhook_urls: Vec<String>,
    pub webhook_secret: Option<String>,
}

impl Config {
    /// Names of the channels that will be used, for the startup log line.
    pub fn enabled_channels(&self) -> Vec<&'static str> {
        let mut channels = Vec::new();
        if self.desktop {
            channels.push("desktop");
        }
        if self.bark_key.is_some() {
            channels.push("bark");
        }
        if self.slack_webhook_url.is_some() {
            channels.push("slack");
        }
        if !self.webhook_urls.is_empty() {
            channels.push("webhook");
        }
        channels
    }
}

/// Resolve `cli` into a `Config`. Empty strings for optional settings mean
/// "unset", so `GH_PR_NOTIFY_BARK_KEY=` disables Bark.
pub fn load(cli: Cli) -> anyhow::Result<Config> {
    let state_path = match cli.state_file {
        Some(path) => path,
        None => default_state_path()?,
    };

    let author = non_empty(Some(cli.author.trim().to_string()))
        .context("--author must not be empty")?;
    let bark_key = non_empty(cli.bark_key);
    let slack_webhook_url = non_empty(cli.slack_webhook_url);
    let webhook_urls: Vec<String> = cli
        .webhook_url
        .into_iter()
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    if bark_key.is_some() {
        validate_endpoint("--bark-server", &cli.bark_server)?;
    }
    if let Some(url) = &slack_webhook_url {
        validate_endpoint("--slack-webhook-url", url)?;
    }
    for url in &webhook_urls {
        validate_endpoint("--webhook-url", url)?;
    }

    Ok(Config {
        interval: cli.interval,
        state_path,
        author,
        first_sighting: if cli.skip_initially_approved {
            FirstSighting::Skip
        } else {
            FirstSighting::Notify
        },
        lookup_concurrency: usize::from(cli.lookup_concurrency.max(1)),
        once: cli.once,
        desktop: !cli.no_desktop,
        sound: cli.sound,
        bark_key,
        bark_server: cli.bark_server,
        bark_sound: cli.bark_sound,
        slack_webhook_url,
        webhook_urls,
        webhook_secret: non_empty(cli.webhook_secret),
    })
}

/// `~/.local/state/gh-pr-notify/state.json`. The directory is created here so
/// that an unusable location fails at startup rather than on the first save.
pub fn default_state_path() -> anyhow::Result<PathBuf> {
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .context("cannot resolve state directory: HOME is not set")?;
    let dir = PathBuf::from(home)
        .join(".local")
        .join("state")
        .join(STATE_DIR_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating state dir {}", dir.display()))?;
    Ok(dir.join(STATE_FILE_NAME))
}

fn validate_endpoint(flag: &str, value: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(value).with_context(|| format!("{} is not a valid URL: {}", flag, value))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("{} must be an http(s) URL, got scheme '{}'", flag, url.scheme());
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
