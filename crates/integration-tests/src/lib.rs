//! Integration tests for EcoHome.
//!
//! These tests drive a running server over HTTP and need:
//! - A running, migrated `PostgreSQL` database
//! - The server running (`cargo run -p ecohome-server`)
//!
//! `tests/insert_batch.rs` uses the server's repositories directly and only
//! needs the database.
//!
//! ```bash
//! ECOHOME_BASE_URL=http://localhost:3001 cargo test -p ecohome-integration-tests -- --ignored
//! ```
//!
//! Every test creates its own household with a unique name and deletes it at
//! the end, so the suite can run against a shared database.

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("ECOHOME_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}

/// URL for a path under `/api`.
#[must_use]
pub fn api_url(path: &str) -> String {
    format!("{}/api{path}", base_url())
}

/// HTTP client for the test suite.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .build()
        .expect("Failed to create HTTP client")
}

/// A household as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct HouseholdJson {
    pub id: i32,
    pub name: String,
    pub postcode: String,
    pub members: i32,
}

/// Create a household with a unique name.
pub async fn create_household(client: &Client, postcode: &str) -> HouseholdJson {
    let name = format!("Test Household {}", Uuid::new_v4().simple());
    let resp = client
        .post(api_url("/households"))
        .json(&json!({ "name": name, "postcode": postcode, "members": 2 }))
        .send()
        .await
        .expect("Failed to create test household");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse household")
}

/// Delete a household, ignoring the outcome.
pub async fn delete_household(client: &Client, id: i32) {
    let _ = client
        .delete(api_url(&format!("/households/{id}")))
        .send()
        .await;
}

/// Record a reading and return the created entry.
pub async fn record_usage(
    client: &Client,
    household_id: i32,
    entry_type: &str,
    value: f64,
) -> Value {
    let resp = client
        .post(api_url("/usage"))
        .json(&json!({
            "household_id": household_id,
            "entry_type": entry_type,
            "value": value,
        }))
        .send()
        .await
        .expect("Failed to record usage");

    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Failed to parse usage entry")
}

/// Fetch the dashboard JSON for a household.
pub async fn dashboard(client: &Client, household_id: i32) -> Value {
    let resp = client
        .get(api_url(&format!("/households/{household_id}")))
        .send()
        .await
        .expect("Failed to load dashboard");

    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse dashboard")
}

/// Number of entries in a household's CSV export.
pub async fn exported_rows(client: &Client, household_id: i32) -> usize {
    let resp = client
        .get(api_url(&format!("/usage/export/{household_id}")))
        .send()
        .await
        .expect("Failed to export usage");

    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.expect("Failed to read export");
    body.lines().skip(1).filter(|line| !line.is_empty()).count()
}
