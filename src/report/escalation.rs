//! Severity-driven escalation policy

use super::Severity;

/// Client-facing message for a finished structured summary
pub fn escalation_message(severity: Severity) -> &'static str {
    match severity {
        Severity::Severe => "Alert sent to doctor due to severe symptoms.",
        Severity::Moderate => "You should consult the doctor.",
        Severity::Mild => "You are going good! I will catch up with you tomorrow.",
        Severity::Unspecified => "Severity not specified.",
    }
}

/// Only severe summaries page the doctor
pub fn requires_alert(severity: Severity) -> bool {
    severity == Severity::Severe
}
