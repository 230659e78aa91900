//! Household domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ecohome_core::{HouseholdId, HouseholdName, Members, Postcode};

/// A registered household.
#[derive(Debug, Clone, Serialize)]
pub struct Household {
    pub id: HouseholdId,
    pub name: HouseholdName,
    pub postcode: Postcode,
    /// Number of occupants.
    pub members: Members,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for registering a household.
#[derive(Debug, Clone)]
pub struct NewHousehold {
    pub name: HouseholdName,
    pub postcode: Postcode,
    pub members: Members,
}

/// A partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default)]
pub struct HouseholdChanges {
    pub name: Option<HouseholdName>,
    pub postcode: Option<Postcode>,
    pub members: Option<Members>,
}

impl HouseholdChanges {
    /// Returns `true` if no field would change.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.postcode.is_none() && self.members.is_none()
    }
}
