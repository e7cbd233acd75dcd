//! iOS push notifications through a Bark server (https://github.com/Finb/Bark).
//!
//! Tapping the push opens the PR URL.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Notification, Notifier, NOTIFICATION_GROUP};
use crate::errors::NotifyError;

pub const DEFAULT_SERVER: &str = "https://api.day.app";

/// JSON body for Bark's `POST /push`.
#[derive(Debug, Serialize)]
pub struct BarkPayload<'a> {
    pub device_key: &'a str,
    pub title: &'a str,
    pub subtitle: &'a str,
    pub body: &'a str,
    pub url: &'a str,
    pub group: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub sound: &'a str,
}

/// Bark answers `{"code": 200, "message": "success"}`; any other code means
/// the push was refused (bad device key and so on).
#[derive(Debug, Deserialize)]
struct BarkResponse {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Clone)]
pub struct BarkNotifier {
    client: reqwest::Client,
    device_key: String,
    server: String,
    sound: String,
}

impl BarkNotifier {
    pub fn new(device_key: String, server: String, sound: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("failed to build Bark HTTP client"),
            device_key,
            server: server.trim_end_matches('/').to_string(),
            sound,
        }
    }

    pub fn push_url(&self) -> String {
        format!("{}/push", self.server)
    }
}

#[async_trait]
impl Notifier for BarkNotifier {
    fn name(&self) -> &'static str {
        "bark"
    }

    async fn deliver(&self, n: &Notification) -> Result<(), NotifyError> {
        let payload = BarkPayload {
            device_key: &self.device_key,
            title: &n.title,
            subtitle: &n.subtitle,
            body: &n.body,
            url: n.url.as_deref().unwrap_or_default(),
            group: NOTIFICATION_GROUP,
            sound: &self.sound,
        };

        let resp = self
            .client
            .post(self.push_url())
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        let result: BarkResponse = resp.json().await?;
        if result.code != 200 {
            return Err(NotifyError::Rejected {
                code: result.code,
                message: result.message,
            });
        }

        tracing::debug!(key = %n.subtitle, server = %self.server, "bark push delivered");
        Ok(())
    }
}
