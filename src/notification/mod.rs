//! Notifiers: deliver "PR approved" messages to a human.
//!
//! Every notifier is best-effort. A failure is reported back to the poll
//! cycle, which logs it and moves on; nothing here is retried across cycles.

pub mod bark;
pub mod desktop;
pub mod slack;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::errors::NotifyError;
use crate::models::PullRequest;

/// Group / thread identifier used by channels that support one.
pub const NOTIFICATION_GROUP: &str = "gh-pr-notify";

/// Channel-neutral message content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub url: Option<String>,
    /// The PR this message is about, for channels that send structured events.
    pub pull_request: PullRequest,
}

impl Notification {
    pub fn approved(pr: &PullRequest) -> Self {
        Self {
            title: "PR Approved".to_string(),
            subtitle: pr.key().to_string(),
            body: pr.title.clone(),
            url: (!pr.url.is_empty()).then(|| pr.url.clone()),
            pull_request: pr.clone(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name used in logs.
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Build the notifiers enabled by `cfg`, in a fixed order.
pub fn from_config(cfg: &Config) -> Vec<Arc<dyn Notifier>> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if cfg.desktop {
        notifiers.push(Arc::new(desktop::DesktopNotifier::new(cfg.sound.clone())));
    }
    if let Some(key) = &cfg.bark_key {
        notifiers.push(Arc::new(bark::BarkNotifier::new(
            key.clone(),
            cfg.bark_server.clone(),
            cfg.bark_sound.clone(),
        )));
    }
    if let Some(url) = &cfg.slack_webhook_url {
        notifiers.push(Arc::new(slack::SlackNotifier::new(url.clone())));
    }
    if !cfg.webhook_urls.is_empty() {
        notifiers.push(Arc::new(webhook::WebhookNotifier::new(
            cfg.webhook_urls.clone(),
            cfg.webhook_secret.clone(),
        )));
    }

    notifiers
}
