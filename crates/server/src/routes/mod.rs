//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                            - Readiness (database probe)
//! GET    /health/live                       - Liveness
//!
//! # Households
//! GET    /api/households                    - List, newest first
//! POST   /api/households                    - Register
//! GET    /api/households/{id}               - Dashboard (entries, totals, score, tips)
//! PUT    /api/households/{id}               - Partial update
//! DELETE /api/households/{id}               - Delete with all entries
//!
//! # Usage entries
//! POST   /api/usage                         - Record a reading
//! GET    /api/usage/{id}                    - Fetch one entry
//! PUT    /api/usage/{id}                    - Partial update
//! DELETE /api/usage/{id}                    - Delete
//! GET    /api/usage/export/{household_id}   - CSV download
//! POST   /api/usage/import/{household_id}   - CSV upload (all or nothing)
//! ```

pub mod health;
pub mod households;
pub mod usage;

use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::Response,
    middleware::from_fn,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::middleware::{request_id, request_id_middleware};
use crate::state::AppState;

/// Body of responses that only carry a confirmation.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Name the missing resource in a repository `NotFound`.
pub(crate) fn not_found_as(err: RepositoryError, resource: &'static str) -> AppError {
    match err {
        RepositoryError::NotFound => AppError::NotFound(resource),
        other => AppError::Database(other),
    }
}

/// Routes nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/households",
            get(households::index).post(households::create),
        )
        .route(
            "/households/{id}",
            get(households::show)
                .put(households::update)
                .delete(households::destroy),
        )
        .route("/usage", post(usage::create))
        .route(
            "/usage/{id}",
            get(usage::show).put(usage::update).delete(usage::destroy),
        )
        .route("/usage/export/{household_id}", get(usage::export))
        .route("/usage/import/{household_id}", post(usage::import))
}

/// Build the full application router with its middleware stack.
///
/// Sentry layers are added by the binary so tests can build the router
/// without a Sentry client.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::readiness))
        .route("/health/live", get(health::liveness))
        .nest("/api", api_routes())
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = request_id(request.headers()).unwrap_or_default(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Method, StatusCode, header},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::config::ServerConfig;
    use crate::db;
    use crate::middleware::REQUEST_ID_HEADER;

    /// A router whose pool points at a closed port, so any handler that
    /// reaches the database fails fast.
    fn test_app() -> Router {
        let mut config = ServerConfig::from_lookup(|_| None).unwrap();
        config.database.host = "127.0.0.1".to_owned();
        config.database.port = 1;
        config.database.acquire_timeout = Duration::from_millis(200);
        let pool = db::create_pool(&config.database).unwrap();
        app(AppState::new(config, pool))
    }

    fn json_request(method: Method, uri: &str, body: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    async fn send(request: axum::http::Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_create_household_requires_fields() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/households",
            r#"{"name":"Smiths"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Name and postcode are required");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = send(json_request(Method::POST, "/api/households", "{nope")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_create_usage_rejects_unknown_entry_type() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/usage",
            r#"{"household_id":1,"entry_type":"gas","value":3}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("water"));
    }

    #[tokio::test]
    async fn test_empty_update_is_bad_request() {
        let (status, _) = send(json_request(Method::PUT, "/api/households/1", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(json_request(Method::PUT, "/api/usage/1", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let request = axum::http::Request::builder()
            .uri("/api/households/abc")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_import_without_csv_data_is_bad_request() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/usage/import/1",
            r#"{"csv_data":""}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "CSV data required");
    }

    #[tokio::test]
    async fn test_health_reports_unavailable_database() {
        let request = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            serde_json::json!({ "status": "error", "message": "Database unavailable" })
        );
    }

    #[tokio::test]
    async fn test_liveness_and_request_id() {
        let request = axum::http::Request::builder()
            .uri("/health/live")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "abc-123");

        let request = axum::http::Request::builder()
            .uri("/health/live")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let request = axum::http::Request::builder()
            .uri("/api/nothing-here")
            .body(Body::empty())
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
