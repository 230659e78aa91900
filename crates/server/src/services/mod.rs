//! Business logic services for the server.
//!
//! # Services
//!
//! - `green_score` - Load a household's scoring window and score it
//! - `dashboard` - Assemble the household dashboard response
//! - `usage_csv` - CSV export and all-or-nothing CSV import

pub mod dashboard;
pub mod green_score;
pub mod usage_csv;
