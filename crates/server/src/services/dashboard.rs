//! Household dashboard assembly.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;

use ecohome_core::{BinSchedule, HouseholdId, ScoreBreakdown};

use super::green_score::score_household;
use crate::db::{HouseholdRepository, RepositoryError, UsageRepository};
use crate::models::{Household, UsageEntry, UsageSummary};

/// Everything the dashboard page shows for one household.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub household: Household,
    /// The 50 most recent entries, newest first.
    pub entries: Vec<UsageEntry>,
    /// Lifetime totals, unlike the score which only sees the last 30 days.
    pub summary: UsageSummary,
    pub green_score: u8,
    pub tips: Vec<String>,
    pub bin_schedule: BinSchedule,
    pub breakdown: ScoreBreakdown,
}

/// Load the dashboard for a household.
///
/// Returns `Ok(None)` if the household does not exist.
///
/// # Errors
///
/// Returns `RepositoryError` if any of the underlying reads fail.
pub async fn load_dashboard(
    pool: &PgPool,
    id: HouseholdId,
) -> Result<Option<Dashboard>, RepositoryError> {
    let Some(household) = HouseholdRepository::new(pool).get(id).await? else {
        return Ok(None);
    };

    let usage = UsageRepository::new(pool);
    let entries = usage.recent_for_household(id).await?;
    let summary = usage.totals_for_household(id).await?;
    let scored = score_household(pool, &household, Utc::now()).await?;

    Ok(Some(Dashboard {
        household,
        entries,
        summary,
        green_score: scored.score.value(),
        tips: scored.tips,
        bin_schedule: scored.bin_schedule,
        breakdown: *scored.score.breakdown(),
    }))
}
