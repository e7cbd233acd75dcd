//! macOS banner notifications via `osascript`.
//!
//! osascript can't open a URL when the banner is clicked (that opens Script
//! Editor instead), so the banner carries the PR key and title only.

use async_trait::async_trait;
use tokio::process::Command;

use super::{Notification, Notifier};
use crate::errors::NotifyError;

/// Sound name that disables the notification sound.
pub const SILENT: &str = "none";

#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    sound: String,
}

impl DesktopNotifier {
    /// `sound` is `default`, `none`, or a system sound name (Glass, Hero, Ping, ...).
    pub fn new(sound: impl Into<String>) -> Self {
        Self {
            sound: sound.into(),
        }
    }

    pub fn script(&self, n: &Notification) -> String {
        let mut script = format!(
            r#"display notification "{}" with title "{}" subtitle "{}""#,
            escape(&n.body),
            escape(&n.title),
            escape(&n.subtitle),
        );
        if self.sound != SILENT {
            script.push_str(&format!(r#" sound name "{}""#, escape(&self.sound)));
        }
        script
    }
}

#[async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn deliver(&self, n: &Notification) -> Result<(), NotifyError> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(self.script(n))
            .output()
            .await
            .map_err(|e| NotifyError::Command {
                command: "osascript".to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(NotifyError::Command {
                command: "osascript".to_string(),
                reason: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        tracing::debug!(key = %n.subtitle, "desktop notification shown");
        Ok(())
    }
}

/// Escape for an AppleScript double-quoted string. Backslashes go first so the
/// ones added for quotes are not doubled.
fn escape(s: &str) -> String {
    s.replace('\\', r"\\").replace('"', r#"\""#)
}
