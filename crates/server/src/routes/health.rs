//! Health check endpoints.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum HealthStatus {
    Ok,
    Error,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Readiness check.
///
/// Verifies database connectivity with `SELECT 1`. Returns 503 Service
/// Unavailable if no connection can be acquired within the pool timeout.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match db::ping(state.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthStatus::Ok,
                timestamp: Some(Utc::now()),
                message: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: HealthStatus::Error,
                    timestamp: None,
                    message: Some("Database unavailable"),
                }),
            )
        }
    }
}

/// Liveness check. Does not touch dependencies.
pub async fn liveness() -> &'static str {
    "ok"
}
