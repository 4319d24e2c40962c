//! Session reports
//!
//! The summarizer's output is turned into either a structured record or a
//! raw-text fallback. Structured records carry an optional severity that
//! drives escalation.

mod alert;
mod escalation;
mod summary;

pub use alert::{render_alert_html, ALERT_SUBJECT};
pub use escalation::{escalation_message, requires_alert};
pub use summary::{
    Severity, StructuredSummary, SummaryParseError, SummaryRecord, UNKNOWN_USERNAME,
};
