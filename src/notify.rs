//! Release notifications to a chat webhook.

use async_trait::async_trait;
use semver::Version;
use serde::Serialize;
use url::Url;

use crate::error::NotifyError;
use crate::marketplace::SubmissionReceipt;

/// Destination for release announcements.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Slack-compatible incoming webhook payload.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

/// Posts `{"text": ...}` to an incoming webhook URL.
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    pub fn new(url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(self.url.clone())
            .json(&WebhookPayload { text })
            .send()
            .await
            .map_err(NotifyError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        Ok(())
    }
}

/// Announcement text for a released plugin version.
pub fn release_message(
    display_name: &str,
    version: &Version,
    changelog: &str,
    receipt: Option<&SubmissionReceipt>,
) -> String {
    let mut text = format!(":rocket: *{display_name}* v{version} submitted to the marketplace");

    if let Some(receipt) = receipt {
        text.push_str(&format!(" (status: {})", receipt.status));
        if let Some(url) = &receipt.url {
            text.push_str(&format!("\n<{url}|View listing>"));
        }
    }

    text.push_str("\n\n");
    text.push_str(changelog);
    text
}
