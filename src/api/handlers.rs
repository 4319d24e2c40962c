//! HTTP request handlers

use super::types::{ErrorResponse, Pagination, PingResponse, ReportFilters, ReportsQuery, ReportsResponse};
use super::websocket::{intake_upgrade, routine_check_upgrade};
use super::AppState;
use crate::db::{DbError, SummaryQuery};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        // Session websockets
        .route("/ws", get(intake_upgrade))
        .route("/check", get(routine_check_upgrade))
        // Stored summaries
        .route("/api/reports", get(list_reports))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn ping() -> Json<PingResponse> {
    Json(PingResponse::pong())
}

async fn get_version() -> &'static str {
    concat!("checkup-bot ", env!("CARGO_PKG_VERSION"))
}

async fn list_reports(
    State(state): State<AppState>,
    Query(params): Query<ReportsQuery>,
) -> Result<Json<ReportsResponse>, AppError> {
    let username = params
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::BadRequest("username is required".to_string()))?;

    let query = SummaryQuery::new(username, params.page(), params.limit())
        .with_severity(params.severity.as_deref());

    let db = state.db.clone();
    let lookup = query.clone();
    let (summaries, total_count) = tokio::task::spawn_blocking(move || {
        let total = db.count_summaries(&lookup)?;
        let summaries = db.list_summaries(&lookup)?;
        Ok::<_, DbError>((summaries, total))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    tracing::debug!(
        username = %query.username,
        page = query.page,
        total_count,
        "Listed reports"
    );

    Ok(Json(ReportsResponse {
        summaries,
        pagination: Pagination::new(query.page, query.total_pages(total_count), total_count),
        filters: ReportFilters {
            severity: query.severity,
        },
    }))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    Internal(String),
}

impl From<DbError> for AppError {
    fn from(e: DbError) -> Self {
        tracing::error!(error = %e, "Database error");
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
