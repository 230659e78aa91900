//! Green score calculator.
//!
//! The score summarizes the last 30 days of a household's usage as an integer
//! in `0..=100`:
//!
//! 1. Entries are grouped by the UTC calendar day of `recorded_at`.
//! 2. Water and energy are summed per day; a resource's daily average only
//!    counts days that have at least one entry of that resource.
//! 3. Each average becomes a sub-score `clamp((1 - avg / baseline) * 100 + 50, 0, 100)`.
//!    A resource with no data scores 50.
//! 4. The final score is the rounded mean of the two sub-scores.
//!
//! An empty window scores exactly 50 and gets no tier tips, only the bin-day
//! note. Everything here is pure; loading the
//! entries is the caller's job.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use crate::types::{EntryType, UsageValue};

/// Neutral daily water consumption in litres.
pub const WATER_BASELINE: f64 = 200.0;

/// Neutral daily energy consumption in kWh.
pub const ENERGY_BASELINE: f64 = 20.0;

/// Length of the trailing scoring window.
pub const SCORE_WINDOW_DAYS: i64 = 30;

/// Score reported when there is nothing to score.
pub const NEUTRAL_SCORE: u8 = 50;

/// Sub-score used for a resource with no qualifying days.
const NEUTRAL_SUB_SCORE: f64 = 50.0;

/// Scores below this get the low-tier tips.
pub const MODERATE_THRESHOLD: u8 = 30;

/// Scores at or above this get the high-tier tips.
pub const HIGH_THRESHOLD: u8 = 60;

/// The fields of a usage entry the calculator needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct ScoredEntry {
    pub entry_type: EntryType,
    pub value: UsageValue,
    pub recorded_at: DateTime<Utc>,
}

/// Per-resource detail behind a [`GreenScore`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    /// Days in the window with at least one water entry.
    pub water_days: usize,
    /// Days in the window with at least one energy entry.
    pub energy_days: usize,
    /// Mean daily water total, if any water was recorded.
    pub water_average: Option<f64>,
    /// Mean daily energy total, if any energy was recorded.
    pub energy_average: Option<f64>,
    pub water_score: f64,
    pub energy_score: f64,
}

impl ScoreBreakdown {
    const NEUTRAL: Self = Self {
        water_days: 0,
        energy_days: 0,
        water_average: None,
        energy_average: None,
        water_score: NEUTRAL_SUB_SCORE,
        energy_score: NEUTRAL_SUB_SCORE,
    };
}

/// A computed green score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GreenScore {
    score: u8,
    breakdown: ScoreBreakdown,
}

#[derive(Default)]
struct DayTotals {
    water: Option<Decimal>,
    energy: Option<Decimal>,
}

impl GreenScore {
    /// Score the entries recorded in the 30 days up to `now`.
    ///
    /// Entries older than the window are ignored, so callers may pass a
    /// superset.
    #[must_use]
    pub fn compute<'a, I>(entries: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a ScoredEntry>,
    {
        let window_start = now - Duration::days(SCORE_WINDOW_DAYS);

        let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
        for entry in entries
            .into_iter()
            .filter(|entry| entry.recorded_at >= window_start)
        {
            let totals = days.entry(entry.recorded_at.date_naive()).or_default();
            let slot = match entry.entry_type {
                EntryType::Water => &mut totals.water,
                EntryType::Energy => &mut totals.energy,
            };
            *slot = Some(slot.unwrap_or_default() + entry.value.as_decimal());
        }

        if days.is_empty() {
            return Self {
                score: NEUTRAL_SCORE,
                breakdown: ScoreBreakdown::NEUTRAL,
            };
        }

        let (water_days, water_average) = daily_average(days.values().filter_map(|d| d.water));
        let (energy_days, energy_average) = daily_average(days.values().filter_map(|d| d.energy));

        let water_score =
            water_average.map_or(NEUTRAL_SUB_SCORE, |avg| sub_score(avg, WATER_BASELINE));
        let energy_score =
            energy_average.map_or(NEUTRAL_SUB_SCORE, |avg| sub_score(avg, ENERGY_BASELINE));

        Self {
            score: blend(water_score, energy_score),
            breakdown: ScoreBreakdown {
                water_days,
                energy_days,
                water_average,
                energy_average,
                water_score,
                energy_score,
            },
        }
    }

    /// The score, `0..=100`.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.score
    }

    /// The sub-scores and averages the score was built from.
    #[must_use]
    pub const fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }

    /// Whether any entry fell inside the window.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.breakdown.water_days + self.breakdown.energy_days > 0
    }

    /// Tips for this score and postcode.
    ///
    /// An empty window only gets the bin-day note; otherwise see [`generate_tips`].
    #[must_use]
    pub fn tips(&self, postcode: &str) -> Vec<String> {
        if self.has_data() {
            generate_tips(self.score, postcode)
        } else {
            vec![bin_day_tip(postcode)]
        }
    }
}

/// Returns the number of days and their mean total, or `None` without days.
fn daily_average(totals: impl Iterator<Item = Decimal>) -> (usize, Option<f64>) {
    let (count, sum) = totals.fold((0usize, Decimal::ZERO), |(n, sum), day| (n + 1, sum + day));
    if count == 0 {
        return (0, None);
    }
    #[allow(clippy::cast_precision_loss)] // At most 31 days in the window
    let average = sum.to_f64().unwrap_or(0.0) / count as f64;
    (count, Some(average))
}

fn sub_score(average: f64, baseline: f64) -> f64 {
    (1.0 - average / baseline).mul_add(100.0, 50.0).clamp(0.0, 100.0)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // Clamped sub-scores keep this in 0..=100
fn blend(water_score: f64, energy_score: f64) -> u8 {
    0.5f64
        .mul_add(energy_score, 0.5 * water_score)
        .round()
        .clamp(0.0, 100.0) as u8
}

/// Tip tier selected by score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// Below 30.
    Low,
    /// 30 to 59.
    Moderate,
    /// 60 and above.
    High,
}

impl ScoreTier {
    /// Tier for a score.
    #[must_use]
    pub const fn for_score(score: u8) -> Self {
        if score < MODERATE_THRESHOLD {
            Self::Low
        } else if score < HIGH_THRESHOLD {
            Self::Moderate
        } else {
            Self::High
        }
    }

    /// The two recommendations for this tier.
    #[must_use]
    pub const fn tips(self) -> [&'static str; 2] {
        match self {
            Self::Low => [
                "Your score is low: consider an energy audit and reduce standby power (unplug chargers and unused devices).",
                "Install low-flow shower heads and check for leaks to reduce water usage.",
            ],
            Self::Moderate => [
                "Good start: replace old incandescent bulbs with LED and run full loads in the washing machine and dishwasher.",
                "Track shower times and set a family challenge to save water each week.",
            ],
            Self::High => [
                "Great job! Keep monitoring and consider solar panels or a rainwater tank for further gains.",
                "Share your habits with neighbours and start a community swap or tool library.",
            ],
        }
    }
}

/// General-waste and recycling collection days for a postcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BinSchedule {
    pub general: &'static str,
    pub recycling: &'static str,
}

const BIN_SCHEDULES: &[(&str, BinSchedule)] = &[
    ("6000", BinSchedule { general: "Monday", recycling: "Wednesday" }),
    ("6001", BinSchedule { general: "Tuesday", recycling: "Thursday" }),
    ("6002", BinSchedule { general: "Wednesday", recycling: "Friday" }),
    ("6003", BinSchedule { general: "Thursday", recycling: "Monday" }),
];

const DEFAULT_BIN_SCHEDULE: BinSchedule = BinSchedule {
    general: "Friday",
    recycling: "Tuesday",
};

/// Look up the bin schedule for a postcode.
///
/// Whitespace is removed and the first four characters are matched against
/// known prefixes; anything else gets the default Friday/Tuesday schedule.
#[must_use]
pub fn bin_schedule(postcode: &str) -> BinSchedule {
    let prefix: String = postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .take(4)
        .collect();

    BIN_SCHEDULES
        .iter()
        .find(|(known, _)| *known == prefix)
        .map_or(DEFAULT_BIN_SCHEDULE, |(_, schedule)| *schedule)
}

/// Build the three tips shown with a score: two for the tier, then the bin days.
#[must_use]
pub fn generate_tips(score: u8, postcode: &str) -> Vec<String> {
    let mut tips: Vec<String> = ScoreTier::for_score(score)
        .tips()
        .iter()
        .map(|tip| (*tip).to_owned())
        .collect();
    tips.push(bin_day_tip(postcode));
    tips
}

fn bin_day_tip(postcode: &str) -> String {
    let schedule = bin_schedule(postcode);
    format!(
        "General waste day: {}. Recycling day: {}.",
        schedule.general, schedule.recycling
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap()
    }

    fn entry(entry_type: EntryType, value: &str, days_ago: i64) -> ScoredEntry {
        ScoredEntry {
            entry_type,
            value: UsageValue::parse(value).unwrap(),
            recorded_at: now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_no_entries_scores_neutral() {
        let score = GreenScore::compute(&[] as &[ScoredEntry], now());
        assert_eq!(score.value(), 50);
        assert_eq!(score.breakdown().water_days, 0);
    }

    #[test]
    fn test_only_old_entries_scores_neutral() {
        let entries = [entry(EntryType::Water, "0", 31), entry(EntryType::Energy, "500", 45)];
        let score = GreenScore::compute(&entries, now());
        assert_eq!(score.value(), 50);
        assert!(!score.has_data());
    }

    #[test]
    fn test_empty_window_gets_only_bin_day_tip() {
        let score = GreenScore::compute(&[] as &[ScoredEntry], now());
        assert_eq!(
            score.tips("6000"),
            vec!["General waste day: Monday. Recycling day: Wednesday.".to_owned()]
        );
    }

    #[test]
    fn test_scored_window_gets_three_tips() {
        // Water at baseline scores exactly 50, same as an empty window.
        let score = GreenScore::compute(&[entry(EntryType::Water, "200", 1)], now());
        assert_eq!(score.value(), 50);
        assert!(score.has_data());

        let tips = score.tips("9999");
        assert_eq!(tips.len(), 3);
        assert_eq!(tips[0], ScoreTier::Moderate.tips()[0]);
        assert_eq!(tips[2], "General waste day: Friday. Recycling day: Tuesday.");
    }

    #[test]
    fn test_water_at_baseline_scores_fifty() {
        let entries = [
            entry(EntryType::Water, "120", 1),
            entry(EntryType::Water, "80", 1),
            entry(EntryType::Water, "200", 2),
        ];
        let score = GreenScore::compute(&entries, now());
        let breakdown = score.breakdown();
        assert_eq!(breakdown.water_days, 2);
        assert_eq!(breakdown.water_average, Some(200.0));
        assert!((breakdown.water_score - 50.0).abs() < f64::EPSILON);
        assert!((breakdown.energy_score - 50.0).abs() < f64::EPSILON);
        assert_eq!(score.value(), 50);
    }

    #[test]
    fn test_zero_water_clamps_to_hundred() {
        let entries = [entry(EntryType::Water, "0", 3)];
        let score = GreenScore::compute(&entries, now());
        assert!((score.breakdown().water_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(score.value(), 75);
    }

    #[test]
    fn test_days_without_a_resource_do_not_dilute_its_average() {
        // Energy on two days, water on only one of them.
        let entries = [
            entry(EntryType::Energy, "10", 1),
            entry(EntryType::Energy, "10", 2),
            entry(EntryType::Water, "100", 2),
        ];
        let breakdown = *GreenScore::compute(&entries, now()).breakdown();
        assert_eq!(breakdown.water_days, 1);
        assert_eq!(breakdown.energy_days, 2);
        assert_eq!(breakdown.water_average, Some(100.0));
        assert_eq!(breakdown.energy_average, Some(10.0));
        // water: (1 - 0.5) * 100 + 50 = 100; energy: same.
        assert_eq!(GreenScore::compute(&entries, now()).value(), 100);
    }

    #[test]
    fn test_heavy_usage_clamps_to_zero() {
        let entries = [
            entry(EntryType::Water, "1000", 0),
            entry(EntryType::Energy, "90", 0),
        ];
        assert_eq!(GreenScore::compute(&entries, now()).value(), 0);
    }

    #[test]
    fn test_mixed_usage_rounds_blend() {
        // water avg 250 -> 25; energy avg 15 -> 75; blend 50.
        let entries = [
            entry(EntryType::Water, "250", 5),
            entry(EntryType::Energy, "15", 5),
        ];
        assert_eq!(GreenScore::compute(&entries, now()).value(), 50);

        // water avg 197 -> 51.5; energy none -> 50; blend 50.75 -> 51.
        let entries = [entry(EntryType::Water, "197", 5)];
        assert_eq!(GreenScore::compute(&entries, now()).value(), 51);
    }

    #[test]
    fn test_score_always_in_range() {
        let values = ["0", "0.01", "19.99", "20", "150", "200", "399.99", "5000", "99999999.99"];
        for water in values {
            for energy in values {
                let entries = [
                    entry(EntryType::Water, water, 4),
                    entry(EntryType::Energy, energy, 6),
                ];
                let score = GreenScore::compute(&entries, now()).value();
                assert!(score <= 100, "score {score} out of range");
            }
        }
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let entries = [entry(EntryType::Water, "0", 30)];
        assert_eq!(GreenScore::compute(&entries, now()).value(), 75);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(ScoreTier::for_score(0), ScoreTier::Low);
        assert_eq!(ScoreTier::for_score(29), ScoreTier::Low);
        assert_eq!(ScoreTier::for_score(30), ScoreTier::Moderate);
        assert_eq!(ScoreTier::for_score(59), ScoreTier::Moderate);
        assert_eq!(ScoreTier::for_score(60), ScoreTier::High);
        assert_eq!(ScoreTier::for_score(100), ScoreTier::High);
    }

    #[test]
    fn test_tips_are_tier_then_bin_day() {
        for (score, tier) in [
            (29, ScoreTier::Low),
            (30, ScoreTier::Moderate),
            (59, ScoreTier::Moderate),
            (60, ScoreTier::High),
        ] {
            let tips = generate_tips(score, "6000");
            assert_eq!(tips.len(), 3);
            assert_eq!(tips[0], tier.tips()[0]);
            assert_eq!(tips[1], tier.tips()[1]);
            assert_eq!(tips[2], "General waste day: Monday. Recycling day: Wednesday.");
        }
    }

    #[test]
    fn test_bin_schedule_ignores_whitespace() {
        let expected = BinSchedule {
            general: "Monday",
            recycling: "Wednesday",
        };
        assert_eq!(bin_schedule("6000 "), expected);
        assert_eq!(bin_schedule("6000"), expected);
        assert_eq!(bin_schedule(" 60 00"), expected);
        assert_eq!(bin_schedule("60019"), bin_schedule("6001"));
    }

    #[test]
    fn test_bin_schedule_default() {
        assert_eq!(bin_schedule("9999"), DEFAULT_BIN_SCHEDULE);
        assert_eq!(bin_schedule(""), DEFAULT_BIN_SCHEDULE);
        assert_eq!(DEFAULT_BIN_SCHEDULE.general, "Friday");
        assert_eq!(DEFAULT_BIN_SCHEDULE.recycling, "Tuesday");
    }

    #[test]
    fn test_score_serializes_with_breakdown() {
        let entries = [entry(EntryType::Energy, "20", 1)];
        let json = serde_json::to_value(GreenScore::compute(&entries, now())).unwrap();
        assert_eq!(json["score"], 50);
        assert_eq!(json["breakdown"]["energyDays"], 1);
        assert!(json["breakdown"]["waterAverage"].is_null());
    }
}
