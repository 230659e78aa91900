//! Usage entry domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use ecohome_core::{EntryType, HouseholdId, UsageEntryId, UsageValue};

/// A single water or energy reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UsageEntry {
    pub id: UsageEntryId,
    pub household_id: HouseholdId,
    pub entry_type: EntryType,
    pub value: UsageValue,
    pub recorded_at: DateTime<Utc>,
}

/// Validated fields for recording a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewUsageEntry {
    pub household_id: HouseholdId,
    pub entry_type: EntryType,
    pub value: UsageValue,
    pub recorded_at: DateTime<Utc>,
}

/// A partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct UsageChanges {
    pub entry_type: Option<EntryType>,
    pub value: Option<UsageValue>,
    pub recorded_at: Option<DateTime<Utc>>,
}

impl UsageChanges {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entry_type.is_none() && self.value.is_none() && self.recorded_at.is_none()
    }
}

/// Lifetime totals per category.
///
/// A category with no entries is omitted from the JSON object rather than
/// reported as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub water: Option<Decimal>,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub energy: Option<Decimal>,
}

impl UsageSummary {
    /// Record the total for one category.
    pub const fn set(&mut self, entry_type: EntryType, total: Decimal) {
        match entry_type {
            EntryType::Water => self.water = Some(total),
            EntryType::Energy => self.energy = Some(total),
        }
    }
}
