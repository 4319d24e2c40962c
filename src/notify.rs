//! Doctor alert channels
//!
//! Severe summaries are pushed out through whichever channels are configured:
//! an HTML alert posted to a mail relay webhook, a short Twilio call, or both.
//! With nothing configured the alert is only logged.

mod twilio;
mod webhook;

pub use twilio::{TwilioCallNotifier, TwilioConfig};
pub use webhook::WebhookNotifier;

use crate::report::StructuredSummary;
use crate::runtime::{Notifier, NotifierError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Alert channel configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
    pub twilio: Option<TwilioConfig>,
}

impl NotifierConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let twilio = match (
            var("TWILIO_ACCOUNT_SID"),
            var("TWILIO_AUTH_TOKEN"),
            var("TWILIO_PHONE_NUMBER"),
            var("DOCTOR_PHONE_NUMBER"),
        ) {
            (Some(account_sid), Some(auth_token), Some(from_number), Some(to_number)) => {
                Some(TwilioConfig {
                    account_sid,
                    auth_token,
                    from_number,
                    to_number,
                })
            }
            (None, None, None, None) => None,
            _ => {
                tracing::warn!("Twilio environment variables are incomplete, call alerts disabled");
                None
            }
        };

        Self {
            webhook_url: var("ALERT_WEBHOOK_URL"),
            twilio,
        }
    }
}

/// Build the notifier for `config`. HTTP requests are bounded by `timeout`.
pub fn build(config: &NotifierConfig, timeout: Duration) -> Result<Arc<dyn Notifier>, NotifierError> {
    let mut channels: Vec<Arc<dyn Notifier>> = Vec::new();
    if let Some(url) = &config.webhook_url {
        channels.push(Arc::new(WebhookNotifier::new(url.clone(), timeout)?));
    }
    if let Some(twilio) = &config.twilio {
        channels.push(Arc::new(TwilioCallNotifier::new(twilio.clone(), timeout)?));
    }

    let notifier: Arc<dyn Notifier> = match channels.len() {
        0 => Arc::new(LogNotifier),
        1 => channels.remove(0),
        _ => Arc::new(FanoutNotifier { channels }),
    };
    tracing::info!(channel = notifier.channel(), "Doctor alerts configured");
    Ok(notifier)
}

/// Used when no alert channel is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError> {
        let username = summary
            .fields()
            .get("username")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("unknown");
        tracing::warn!(
            username,
            "Severe symptoms reported but no alert channel is configured"
        );
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "log"
    }
}

/// Sends through every channel; fails if any channel fails
struct FanoutNotifier {
    channels: Vec<Arc<dyn Notifier>>,
}

#[async_trait]
impl Notifier for FanoutNotifier {
    async fn notify(&self, summary: &StructuredSummary) -> Result<(), NotifierError> {
        let results =
            futures::future::join_all(self.channels.iter().map(|c| c.notify(summary))).await;

        let mut first_error = None;
        for (channel, result) in self.channels.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(channel = channel.channel(), error = %e, "Alert channel failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn channel(&self) -> &'static str {
        "fanout"
    }
}
