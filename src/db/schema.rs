//! Database schema and types

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS summaries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    username TEXT NOT NULL,
    severity TEXT,
    document TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_summaries_username ON summaries(username, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_summaries_severity ON summaries(severity);
";

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A persisted session summary
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSummary {
    pub id: i64,
    pub session_id: String,
    pub username: String,
    /// Lowercase severity label; `None` for raw or unclassified summaries
    pub severity: Option<String>,
    /// Structured summary with `username`, or `{username, raw_summary}`
    pub document: Value,
    pub created_at: DateTime<Utc>,
}

/// Filter and page selection for listing summaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryQuery {
    pub username: String,
    pub severity: Option<String>,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl SummaryQuery {
    /// Zero, negative or missing paging values fall back to page 1 and the
    /// default limit; the limit is capped.
    pub fn new(username: impl Into<String>, page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            username: username.into(),
            severity: None,
            page: page.filter(|p| *p > 0).unwrap_or(1),
            limit: limit
                .filter(|l| *l > 0)
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .min(MAX_PAGE_LIMIT),
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Option<&str>) -> Self {
        self.severity = severity
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }

    pub fn total_pages(&self, total_count: u64) -> u64 {
        total_count.div_ceil(u64::from(self.limit))
    }
}
