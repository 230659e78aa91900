//! Integration tests for usage entries and CSV import/export.
//!
//! Run with: cargo test -p ecohome-integration-tests -- --ignored

use reqwest::StatusCode;
use serde_json::{Value, json};

use ecohome_integration_tests::{
    api_url, client, create_household, delete_household, exported_rows, record_usage,
};

// ============================================================================
// Entries
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_entry_lifecycle() {
    let client = client();
    let household = create_household(&client, "6002").await;

    let entry = record_usage(&client, household.id, "energy", 12.345).await;
    assert_eq!(entry["value"], 12.35);
    assert_eq!(entry["entry_type"], "energy");
    let entry_id = entry["id"].as_i64().expect("entry id");

    let resp = client
        .put(api_url(&format!("/usage/{entry_id}")))
        .json(&json!({ "value": "9.5" }))
        .send()
        .await
        .expect("Failed to update entry");
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = resp.json().await.expect("Failed to parse entry");
    assert_eq!(updated["value"], 9.5);
    assert_eq!(updated["entry_type"], "energy");

    let resp = client
        .delete(api_url(&format!("/usage/{entry_id}")))
        .send()
        .await
        .expect("Failed to delete entry");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(api_url(&format!("/usage/{entry_id}")))
        .send()
        .await
        .expect("Failed to delete entry");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    delete_household(&client, household.id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_entry_for_missing_household_is_not_found() {
    let resp = client()
        .post(api_url("/usage"))
        .json(&json!({ "household_id": 2_147_483_647, "entry_type": "water", "value": 1 }))
        .send()
        .await
        .expect("Failed to record usage");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// CSV
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_import_then_export() {
    let client = client();
    let household = create_household(&client, "6003").await;

    let csv = "entry_type,value,recorded_at\n\
               water,180.5,2025-03-01T08:00:00Z\n\
               energy,14,2025-03-01\n\
               water,99.999,\n";
    let resp = client
        .post(api_url(&format!("/usage/import/{}", household.id)))
        .header("content-type", "text/csv")
        .body(csv)
        .send()
        .await
        .expect("Failed to import");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse import");
    assert_eq!(body["count"], 3);

    let resp = client
        .get(api_url(&format!("/usage/export/{}", household.id)))
        .send()
        .await
        .expect("Failed to export");
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    assert!(content_type.starts_with("text/csv"));

    let text = resp.text().await.expect("Failed to read export");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id,entry_type,value,recorded_at"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().any(|row| row.contains(",water,180.50,")));
    assert!(rows.iter().any(|row| row.contains(",water,100.00,")));

    delete_household(&client, household.id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_failed_import_writes_nothing() {
    let client = client();
    let household = create_household(&client, "6000").await;
    record_usage(&client, household.id, "water", 150.0).await;

    let csv = "entry_type,value\nwater,100\ngas,5\n";
    let resp = client
        .post(api_url(&format!("/usage/import/{}", household.id)))
        .json(&json!({ "csv_data": csv }))
        .send()
        .await
        .expect("Failed to import");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to parse error");
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Import failed"))
    );

    assert_eq!(exported_rows(&client, household.id).await, 1);

    delete_household(&client, household.id).await;
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_csv_for_missing_household_is_not_found() {
    let client = client();

    let resp = client
        .get(api_url("/usage/export/2147483647"))
        .send()
        .await
        .expect("Failed to export");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = client
        .post(api_url("/usage/import/2147483647"))
        .json(&json!({ "csv_data": "entry_type,value\nwater,1\n" }))
        .send()
        .await
        .expect("Failed to import");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_export_reimports_into_fresh_household() {
    let client = client();
    let source = create_household(&client, "6000").await;
    let target = create_household(&client, "6001").await;

    record_usage(&client, source.id, "water", 210.25).await;
    record_usage(&client, source.id, "energy", 18.0).await;
    record_usage(&client, source.id, "water", 0.0).await;

    let exported = client
        .get(api_url(&format!("/usage/export/{}", source.id)))
        .send()
        .await
        .expect("Failed to export")
        .text()
        .await
        .expect("Failed to read export");

    // The id column is ignored on import
    let resp = client
        .post(api_url(&format!("/usage/import/{}", target.id)))
        .header("content-type", "text/csv")
        .body(exported.clone())
        .send()
        .await
        .expect("Failed to import");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse import");
    assert_eq!(body["count"], 3);

    let reexported = client
        .get(api_url(&format!("/usage/export/{}", target.id)))
        .send()
        .await
        .expect("Failed to export")
        .text()
        .await
        .expect("Failed to read export");

    assert_eq!(type_value_pairs(&exported), type_value_pairs(&reexported));

    delete_household(&client, source.id).await;
    delete_household(&client, target.id).await;
}

/// Sorted `(entry_type, value)` pairs from an export body.
fn type_value_pairs(csv: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = csv
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split(',').skip(1);
            Some((fields.next()?.to_owned(), fields.next()?.to_owned()))
        })
        .collect();
    pairs.sort();
    pairs
}
