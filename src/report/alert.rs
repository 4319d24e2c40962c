//! HTML rendering of a summary for the doctor alert

use serde_json::{Map, Value};
use std::fmt::Write;

pub const ALERT_SUBJECT: &str = "Patient Alert: Severe Symptoms Detected";

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.5; } \
h2 { color: #2E86C1; } \
table { border-collapse: collapse; width: 100%; } \
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; } \
th { background-color: #f2f2f2; }";

/// Full HTML document: one row per top-level field, `_id` omitted.
pub fn render_alert_html(fields: &Map<String, Value>) -> String {
    let mut rows = String::new();
    for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "_id") {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape(key),
            render_value(value)
        );
    }

    format!(
        "<html><head><style>{STYLE}</style></head><body>\
<h2>{ALERT_SUBJECT}</h2>\
<p>The following patient has reported severe symptoms:</p>\
<table><tr><th>Field</th><th>Value</th></tr>{rows}</table>\
<p>Please take necessary action immediately.</p>\
</body></html>"
    )
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut rows = String::new();
            for (k, v) in map {
                let _ = write!(
                    rows,
                    "<tr><td>{}</td><td>{}</td></tr>",
                    escape(k),
                    render_value(v)
                );
            }
            format!("<table style='border:1px solid #ccc; margin:5px;'>{rows}</table>")
        }
        Value::Array(items) => {
            let mut list = String::new();
            for v in items {
                let _ = write!(list, "<li>{}</li>", render_value(v));
            }
            format!("<ul>{list}</ul>")
        }
        Value::String(s) => escape(s),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
