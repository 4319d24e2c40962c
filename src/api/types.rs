//! API request and response types

use crate::db::StoredSummary;
use serde::{Deserialize, Serialize};

/// Liveness reply
#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

impl PingResponse {
    pub fn pong() -> Self {
        Self {
            message: "pong".to_string(),
        }
    }
}

/// Query string for `/api/reports`.
///
/// Paging values are parsed leniently; anything unparseable falls back to
/// the defaults.
#[derive(Debug, Default, Deserialize)]
pub struct ReportsQuery {
    pub username: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
    pub severity: Option<String>,
}

impl ReportsQuery {
    pub fn page(&self) -> Option<u32> {
        self.page.as_deref().and_then(|p| p.trim().parse().ok())
    }

    pub fn limit(&self) -> Option<u32> {
        self.limit.as_deref().and_then(|l| l.trim().parse().ok())
    }
}

/// One page of stored summaries
#[derive(Debug, Serialize)]
pub struct ReportsResponse {
    pub summaries: Vec<StoredSummary>,
    pub pagination: Pagination,
    pub filters: ReportFilters,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(current_page: u32, total_pages: u64, total_count: u64) -> Self {
        Self {
            current_page,
            total_pages,
            total_count,
            has_next: u64::from(current_page) < total_pages,
            has_prev: current_page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReportFilters {
    pub severity: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
