//! Summary parsing and record shapes

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Username recorded when the session never collected an identity
pub const UNKNOWN_USERNAME: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SummaryParseError {
    #[error("summary is empty")]
    Empty,
    #[error("summary is not valid JSON: {0}")]
    Malformed(String),
    #[error("summary must be a JSON object")]
    NotAnObject,
}

/// Triage level reported by the summarizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
    /// Missing, not a string, or not one of the known levels
    Unspecified,
}

impl Severity {
    /// Case-insensitive; surrounding whitespace is ignored
    pub fn from_field(value: Option<&Value>) -> Self {
        let Some(Value::String(s)) = value else {
            return Severity::Unspecified;
        };
        match s.trim().to_lowercase().as_str() {
            "mild" => Severity::Mild,
            "moderate" => Severity::Moderate,
            "severe" => Severity::Severe,
            _ => Severity::Unspecified,
        }
    }

    /// Stored label; `None` when unspecified
    pub fn label(self) -> Option<&'static str> {
        match self {
            Severity::Mild => Some("mild"),
            Severity::Moderate => Some("moderate"),
            Severity::Severe => Some("severe"),
            Severity::Unspecified => None,
        }
    }
}

/// Field-name to value mapping produced by the summarizer
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredSummary(Map<String, Value>);

impl StructuredSummary {
    /// Parse summarizer output, tolerating one surrounding Markdown code fence
    pub fn parse(text: &str) -> Result<Self, SummaryParseError> {
        let body = strip_code_fence(text);
        if body.is_empty() {
            return Err(SummaryParseError::Empty);
        }
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(SummaryParseError::NotAnObject),
            Err(e) => Err(SummaryParseError::Malformed(e.to_string())),
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::from_field(self.0.get("severity"))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Set `username`, replacing whatever the summarizer put there
    #[must_use]
    pub fn with_username(mut self, username: &str) -> Self {
        self.0
            .insert("username".to_string(), Value::String(username.to_string()));
        self
    }
}

impl From<Map<String, Value>> for StructuredSummary {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// What gets persisted at the end of a session
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryRecord {
    /// Parsed summary with `username` injected
    Structured(StructuredSummary),
    /// The summarizer's text could not be parsed
    Raw { username: String, raw_summary: String },
}

impl SummaryRecord {
    /// Build the record for a finished session. `username` falls back to
    /// [`UNKNOWN_USERNAME`].
    pub fn from_summary(text: &str, username: Option<&str>) -> Self {
        let username = username.unwrap_or(UNKNOWN_USERNAME);
        match StructuredSummary::parse(text) {
            Ok(summary) => SummaryRecord::Structured(summary.with_username(username)),
            Err(e) => {
                tracing::warn!(username, error = %e, "Summary is not structured, keeping raw text");
                SummaryRecord::Raw {
                    username: username.to_string(),
                    raw_summary: text.to_string(),
                }
            }
        }
    }

    pub fn username(&self) -> &str {
        match self {
            SummaryRecord::Structured(summary) => summary
                .fields()
                .get("username")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_USERNAME),
            SummaryRecord::Raw { username, .. } => username,
        }
    }

    /// Severity of structured records; `None` for raw text
    pub fn severity(&self) -> Option<Severity> {
        match self {
            SummaryRecord::Structured(summary) => Some(summary.severity()),
            SummaryRecord::Raw { .. } => None,
        }
    }

    pub fn structured(&self) -> Option<&StructuredSummary> {
        match self {
            SummaryRecord::Structured(summary) => Some(summary),
            SummaryRecord::Raw { .. } => None,
        }
    }

    /// JSON document as stored
    pub fn to_document(&self) -> Value {
        match self {
            SummaryRecord::Structured(summary) => Value::Object(summary.fields().clone()),
            SummaryRecord::Raw {
                username,
                raw_summary,
            } => serde_json::json!({
                "username": username,
                "raw_summary": raw_summary,
            }),
        }
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(body) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    else {
        return trimmed;
    };
    match body.split_once('\n') {
        Some((tag, inner)) if tag.trim().chars().all(char::is_alphanumeric) => inner.trim(),
        _ => body.trim(),
    }
}
