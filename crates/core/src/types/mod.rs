//! Core types for EcoHome.
//!
//! This module provides type-safe wrappers for the household domain.

pub mod entry_type;
pub mod household;
pub mod id;
pub mod usage_value;

pub use entry_type::{EntryType, EntryTypeError};
pub use household::{HouseholdName, Members, MembersError, NameError, Postcode, PostcodeError};
pub use id::*;
pub use usage_value::{UsageValue, ValueError};
