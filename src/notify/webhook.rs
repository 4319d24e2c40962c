//! HTML alert posted to a mail relay

use crate::report::{render_alert_html, StructuredSummary, ALERT_SUBJECT};
use crate::runtime::{Notifier, NotifierError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Serialize)]
struct AlertPayload<'a> {
    subject: &'a str,
    html: String,
    summary: &'a Map<String, Value>,
}

/// Posts `{subject, html, summary}` as JSON to a relay that forwards it by email
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout: Duration) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError> {
        let payload = AlertPayload {
            subject: ALERT_SUBJECT,
            html: render_alert_html(summary.fields()),
            summary: summary.fields(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "webhook"
    }
}
