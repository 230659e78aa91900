//! Domain models for the server.
//!
//! These are the validated shapes that flow between repositories, services
//! and route handlers. Request bodies are parsed into the `New*`/`*Changes`
//! types before any query runs.

pub mod household;
pub mod usage;

pub use household::{Household, HouseholdChanges, NewHousehold};
pub use usage::{NewUsageEntry, UsageChanges, UsageEntry, UsageSummary};
