//! Missed-call alert through the Twilio REST API

use crate::report::StructuredSummary;
use crate::runtime::{Notifier, NotifierError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const TWILIO_API: &str = "https://api.twilio.com/2010-04-01";

/// Placeholder call script; the doctor only needs to see the missed call
const CALL_TWIML_URL: &str = "http://twimlets.com/holdmusic?Bucket=com.twilio.music.ambient";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub to_number: String,
}

#[derive(Deserialize)]
struct CallCreated {
    sid: String,
}

/// Rings the doctor's phone
pub struct TwilioCallNotifier {
    client: Client,
    config: TwilioConfig,
    base_url: String,
}

impl TwilioCallNotifier {
    pub fn new(config: TwilioConfig, timeout: Duration) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifierError::Request(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config,
            base_url: TWILIO_API.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Calls.json",
            self.base_url.trim_end_matches('/'),
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioCallNotifier {
    async fn notify(&self, _summary: &StructuredSummary) -> Result<(), NotifierError> {
        let form = [
            ("To", self.config.to_number.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Url", CALL_TWIML_URL),
        ];

        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
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

        match response.json::<CallCreated>().await {
            Ok(call) => tracing::info!(call_sid = %call.sid, "Placed alert call to doctor"),
            Err(e) => tracing::debug!(error = %e, "Call placed but response was not understood"),
        }
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "twilio"
    }
}
