//! Print a household's green score.

use chrono::Utc;

use ecohome_core::HouseholdId;
use ecohome_server::db::HouseholdRepository;
use ecohome_server::services::green_score::score_household;

use super::{CommandError, connect};

/// Score a household and print the result.
///
/// # Errors
///
/// Returns `CommandError::HouseholdNotFound` for an unknown ID, or a database error.
pub async fn show(household_id: i32) -> Result<(), CommandError> {
    let id = HouseholdId::new(household_id);
    let pool = connect().await?;

    let household = HouseholdRepository::new(&pool)
        .get(id)
        .await?
        .ok_or(CommandError::HouseholdNotFound(id))?;

    let scored = score_household(&pool, &household, Utc::now()).await?;
    let breakdown = scored.score.breakdown();

    #[allow(clippy::print_stdout)]
    {
        println!("{} ({}, {} members)", household.name, household.postcode, household.members.get());
        println!("Green score: {}/100", scored.score.value());
        println!(
            "  water:  {:>5.1} (days {:>2}, avg {})",
            breakdown.water_score,
            breakdown.water_days,
            format_average(breakdown.water_average, "L")
        );
        println!(
            "  energy: {:>5.1} (days {:>2}, avg {})",
            breakdown.energy_score,
            breakdown.energy_days,
            format_average(breakdown.energy_average, "kWh")
        );
        println!("Tips:");
        for tip in &scored.tips {
            println!("  - {tip}");
        }
    }

    pool.close().await;
    Ok(())
}

fn format_average(average: Option<f64>, unit: &str) -> String {
    average.map_or_else(|| "n/a".to_owned(), |avg| format!("{avg:.1} {unit}"))
}
