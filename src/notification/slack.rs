use async_trait::async_trait;
use serde::Serialize;

use super::{Notification, Notifier};
use crate::errors::NotifyError;

/// Posts to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn message(n: &Notification) -> SlackMessage {
        let heading = match &n.url {
            Some(url) => format!("✅ *{}*: <{}|{}>", n.title, url, n.subtitle),
            None => format!("✅ *{}*: {}", n.title, n.subtitle),
        };
        SlackMessage {
            text: format!("{}\n{}", heading, n.body),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn deliver(&self, n: &Notification) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&Self::message(n))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        tracing::info!(key = %n.subtitle, "sent Slack notification");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SlackMessage {
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PullRequest;

    #[test]
    fn test_message_links_the_pull_request() {
        let n = Notification::approved(&PullRequest {
            repository: "o/r".into(),
            number: 3,
            title: "Bump deps".into(),
            url: "https://github.com/o/r/pull/3".into(),
        });
        let msg = SlackNotifier::message(&n);
        assert_eq!(
            msg.text,
            "✅ *PR Approved*: <https://github.com/o/r/pull/3|o/r#3>\nBump deps"
        );
    }
}
