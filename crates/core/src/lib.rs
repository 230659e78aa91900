//! EcoHome Core - Shared domain types and scoring logic.
//!
//! This crate provides the domain layer used by every EcoHome component:
//! - `server` - JSON API over `PostgreSQL`
//! - `cli` - Command-line tools for migrations, seeding and scoring
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. The green score is computed from rows the caller has already
//! loaded, so it can be exercised with plain values in tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, entry categories, postcodes and occupant counts
//! - [`score`] - Green score calculator, tips and bin-schedule lookup

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod score;
pub mod types;

pub use score::{
    BinSchedule, GreenScore, ScoreBreakdown, ScoreTier, ScoredEntry, bin_schedule, generate_tips,
};
pub use types::*;
