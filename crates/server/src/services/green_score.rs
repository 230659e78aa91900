//! Green score over stored usage.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use ecohome_core::score::SCORE_WINDOW_DAYS;
use ecohome_core::{BinSchedule, GreenScore, bin_schedule};

use crate::db::{RepositoryError, UsageRepository};
use crate::models::Household;

/// A household's score with the advice derived from it.
#[derive(Debug, Clone)]
pub struct HouseholdScore {
    pub score: GreenScore,
    pub tips: Vec<String>,
    pub bin_schedule: BinSchedule,
}

/// Score a household against the 30 days ending at `now`.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the usage entries cannot be read.
pub async fn score_household(
    pool: &PgPool,
    household: &Household,
    now: DateTime<Utc>,
) -> Result<HouseholdScore, RepositoryError> {
    let since = now - Duration::days(SCORE_WINDOW_DAYS);
    let entries = UsageRepository::new(pool)
        .window_for_household(household.id, since)
        .await?;

    let score = GreenScore::compute(&entries, now);
    let postcode = household.postcode.as_str();

    tracing::debug!(
        household_id = %household.id,
        entries = entries.len(),
        score = score.value(),
        "Computed green score"
    );

    Ok(HouseholdScore {
        tips: score.tips(postcode),
        bin_schedule: bin_schedule(postcode),
        score,
    })
}
