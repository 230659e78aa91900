//! Integration tests for transactional batch inserts.
//!
//! These talk to the database directly, using the same `DATABASE_URL` /
//! `DB_*` settings as the server.
//!
//! Run with: cargo test -p ecohome-integration-tests -- --ignored

use chrono::Utc;
use uuid::Uuid;

use ecohome_core::{EntryType, HouseholdId, HouseholdName, Members, Postcode, UsageValue};
use ecohome_server::config::ServerConfig;
use ecohome_server::db::{self, HouseholdRepository, RepositoryError, UsageRepository};
use ecohome_server::models::{NewHousehold, NewUsageEntry};

fn reading(household_id: HouseholdId, entry_type: EntryType, value: &str) -> NewUsageEntry {
    NewUsageEntry {
        household_id,
        entry_type,
        value: UsageValue::parse(value).expect("valid value"),
        recorded_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "Requires running database"]
async fn test_failure_after_inserted_rows_commits_nothing() {
    let config = ServerConfig::from_env().expect("Failed to load configuration");
    let pool = db::create_pool(&config.database).expect("Invalid database configuration");

    let household = HouseholdRepository::new(&pool)
        .create(&NewHousehold {
            name: HouseholdName::parse(&format!("Batch {}", Uuid::new_v4().simple()))
                .expect("valid name"),
            postcode: Postcode::parse("6000").expect("valid postcode"),
            members: Members::default(),
        })
        .await
        .expect("Failed to create household");

    // The first two rows insert; the third hits the foreign key.
    let batch = [
        reading(household.id, EntryType::Water, "120"),
        reading(household.id, EntryType::Energy, "14.5"),
        reading(HouseholdId::new(i32::MAX), EntryType::Water, "1"),
    ];

    let usage = UsageRepository::new(&pool);
    let err = usage
        .insert_batch(&batch)
        .await
        .expect_err("batch with a missing household should fail");
    assert!(matches!(err, (Some(2), RepositoryError::NotFound)));

    let stored = usage
        .all_for_household(household.id)
        .await
        .expect("Failed to read entries");
    assert!(stored.is_empty());

    HouseholdRepository::new(&pool)
        .delete(household.id)
        .await
        .expect("Failed to delete household");
    pool.close().await;
}
