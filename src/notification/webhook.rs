use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, warn};

use super::{Notification, Notifier};
use crate::errors::NotifyError;

// ── Webhook Event Types ───────────────────────────────────────

/// A structured event payload sent to webhook endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookEvent {
    /// Event type identifier. Currently always "pr_approved".
    pub event_type: String,
    /// RFC 3339 timestamp of when the event was built.
    pub timestamp: String,
    /// Canonical PR key, e.g. "octo/widgets#42".
    pub key: String,
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub url: Option<String>,
}

impl WebhookEvent {
    pub fn pr_approved(n: &Notification) -> Self {
        Self {
            event_type: "pr_approved".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            key: n.subtitle.clone(),
            repository: n.pull_request.repository.clone(),
            number: n.pull_request.number,
            title: n.pull_request.title.clone(),
            url: n.url.clone(),
        }
    }
}

// ── HMAC Signing ─────────────────────────────────────────────

/// HMAC-SHA256 of `payload` keyed with `secret`, as "sha256=<lowercase hex>".
pub fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

// ── Webhook Notifier ──────────────────────────────────────────

/// Posts `pr_approved` events to one or more URLs.
/// Supports:
/// - HMAC-SHA256 signing (`x-gh-pr-notify-signature` header)
/// - in-call retries with back-off (0s → 1s → 5s by default)
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    urls: Vec<String>,
    signing_secret: Option<String>,
    backoff: Vec<Duration>,
}

impl WebhookNotifier {
    pub fn new(urls: Vec<String>, signing_secret: Option<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent(concat!("gh-pr-notify/", env!("CARGO_PKG_VERSION")))
                .build()
                .expect("failed to build webhook HTTP client"),
            urls,
            signing_secret,
            backoff: vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(5),
            ],
        }
    }

    /// Replace the retry schedule. One attempt is made per entry, after
    /// sleeping for that entry's delay.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = if backoff.is_empty() {
            vec![Duration::ZERO]
        } else {
            backoff
        };
        self
    }

    /// Send one event to one URL, retrying on transport errors and non-2xx.
    pub async fn send(&self, url: &str, event: &WebhookEvent) -> Result<(), NotifyError> {
        let payload = serde_json::to_vec(event).map_err(|e| NotifyError::Command {
            command: "serialize webhook event".to_string(),
            reason: e.to_string(),
        })?;
        let delivery_id = uuid::Uuid::new_v4().to_string();
        let signature = self
            .signing_secret
            .as_deref()
            .map(|s| hmac_sha256_hex(s, &payload));

        let mut last_err = None;

        for (attempt, &delay) in self.backoff.iter().enumerate() {
            if !delay.is_zero() {
                tracing::debug!(
                    url,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying webhook delivery"
                );
                tokio::time::sleep(delay).await;
            }

            let mut req = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .header("x-gh-pr-notify-delivery-id", &delivery_id)
                .header("x-gh-pr-notify-timestamp", &event.timestamp)
                .header("x-gh-pr-notify-event", &event.event_type);

            if let Some(ref sig) = signature {
                req = req.header("x-gh-pr-notify-signature", sig.as_str());
            }

            match req.body(payload.clone()).send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!(
                        url,
                        key = %event.key,
                        delivery_id = %delivery_id,
                        attempt,
                        status = %resp.status(),
                        "webhook delivered"
                    );
                    return Ok(());
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    warn!(
                        url,
                        key = %event.key,
                        delivery_id = %delivery_id,
                        attempt,
                        status = %status,
                        "webhook delivery failed (non-2xx)"
                    );
                    last_err = Some(NotifyError::Status { status, body });
                }
                Err(e) => {
                    warn!(
                        url,
                        key = %event.key,
                        delivery_id = %delivery_id,
                        attempt,
                        error = %e,
                        "webhook request error"
                    );
                    last_err = Some(NotifyError::Transport(e));
                }
            }
        }

        warn!(url, key = %event.key, delivery_id = %delivery_id, "webhook delivery failed after all attempts");
        Err(last_err.unwrap_or(NotifyError::Partial { failed: 1, total: 1 }))
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    /// Every URL is tried independently; one failing does not skip the rest.
    async fn deliver(&self, n: &Notification) -> Result<(), NotifyError> {
        let event = WebhookEvent::pr_approved(n);
        let mut failed = 0;
        let mut only_err = None;

        for url in &self.urls {
            if let Err(e) = self.send(url, &event).await {
                failed += 1;
                only_err = Some(e);
            }
        }

        match (failed, only_err) {
            (0, _) => Ok(()),
            (1, Some(e)) if self.urls.len() == 1 => Err(e),
            _ => Err(NotifyError::Partial {
                failed,
                total: self.urls.len(),
            }),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PullRequest;

    fn notification() -> Notification {
        Notification::approved(&PullRequest {
            repository: "octo/widgets".into(),
            number: 42,
            title: "Add sprockets".into(),
            url: "https://github.com/octo/widgets/pull/42".into(),
        })
    }

    #[test]
    fn test_pr_approved_event_fields() {
        let event = WebhookEvent::pr_approved(&notification());
        assert_eq!(event.event_type, "pr_approved");
        assert_eq!(event.key, "octo/widgets#42");
        assert_eq!(event.repository, "octo/widgets");
        assert_eq!(event.number, 42);
        assert_eq!(event.url.as_deref(), Some("https://github.com/octo/widgets/pull/42"));
    }

    #[test]
    fn test_event_serializes_to_json() {
        let json = serde_json::to_value(WebhookEvent::pr_approved(&notification())).unwrap();
        assert_eq!(json["event_type"], "pr_approved");
        assert_eq!(json["number"], 42);
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_hmac_signature_deterministic() {
        let sig1 = hmac_sha256_hex("secret123", b"payload");
        let sig2 = hmac_sha256_hex("secret123", b"payload");
        assert_eq!(sig1, sig2);
        assert!(sig1.starts_with("sha256="));
        assert_eq!(sig1.len(), "sha256=".len() + 64);
    }

    #[test]
    fn test_hmac_signature_different_secret() {
        let sig1 = hmac_sha256_hex("secret1", b"payload");
        let sig2 = hmac_sha256_hex("secret2", b"payload");
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_empty_backoff_still_attempts_once() {
        let n = WebhookNotifier::new(vec![], None).with_backoff(vec![]);
        assert_eq!(n.backoff, vec![Duration::ZERO]);
    }
}
