//! Seed the database with a demo household.
//!
//! Readings are generated deterministically so repeated runs produce the same
//! pattern: one water and one energy reading per day, varying around the
//! scoring baselines.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use ecohome_core::{EntryType, HouseholdName, Members, Postcode, UsageValue};
use ecohome_server::db::{HouseholdRepository, UsageRepository};
use ecohome_server::models::{NewHousehold, NewUsageEntry};

use super::{CommandError, connect};

/// Daily water reading in litres, 150.00 to 239.50.
fn water_for_day(day: u32) -> UsageValue {
    let cents = 15_000 + i64::from((day * 37) % 90) * 100 + i64::from(day % 2) * 50;
    UsageValue::new(Decimal::new(cents, 2)).unwrap_or(UsageValue::ZERO)
}

/// Daily energy reading in kWh, 12.25 to 22.25.
fn energy_for_day(day: u32) -> UsageValue {
    let cents = 1_225 + i64::from((day * 7) % 11) * 100;
    UsageValue::new(Decimal::new(cents, 2)).unwrap_or(UsageValue::ZERO)
}

/// Create a household and `days` days of readings ending today.
///
/// # Errors
///
/// Returns `CommandError` if an argument is invalid or a database write fails.
pub async fn household(
    name: &str,
    postcode: &str,
    members: i64,
    days: u32,
) -> Result<(), CommandError> {
    let new_household = NewHousehold {
        name: HouseholdName::parse(name)?,
        postcode: Postcode::parse(postcode)?,
        members: Members::new(members)?,
    };

    let pool = connect().await?;

    let household = HouseholdRepository::new(&pool)
        .create(&new_household)
        .await?;
    tracing::info!(household_id = %household.id, name = %household.name, "Created household");

    let today = Utc::now();
    let entries: Vec<NewUsageEntry> = (0..days)
        .flat_map(|day| {
            let recorded_at = today - Duration::days(i64::from(day));
            [
                NewUsageEntry {
                    household_id: household.id,
                    entry_type: EntryType::Water,
                    value: water_for_day(day),
                    recorded_at,
                },
                NewUsageEntry {
                    household_id: household.id,
                    entry_type: EntryType::Energy,
                    value: energy_for_day(day),
                    recorded_at,
                },
            ]
        })
        .collect();

    let inserted = UsageRepository::new(&pool)
        .insert_batch(&entries)
        .await
        .map_err(|(_, e)| e)?;

    tracing::info!(household_id = %household.id, entries = inserted, "Seeding complete!");

    pool.close().await;
    Ok(())
}
