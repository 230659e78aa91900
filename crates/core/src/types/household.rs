//! Validated household fields.
//!
//! Household rows are written from loosely-typed JSON bodies, so the name,
//! postcode and occupant count are parsed into these wrappers before they
//! reach the database.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`HouseholdName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty or only whitespace.
    #[error("name is required")]
    Empty,
    /// The name exceeds the column width.
    #[error("name must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Display name of a household.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-120 characters after trimming
///
/// ```
/// use ecohome_core::HouseholdName;
///
/// assert_eq!(HouseholdName::parse("  The Smiths ").unwrap().as_str(), "The Smiths");
/// assert!(HouseholdName::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct HouseholdName(String);

impl HouseholdName {
    /// Maximum length, matching `households.name VARCHAR(120)`.
    pub const MAX_LENGTH: usize = 120;

    /// Parse a `HouseholdName` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than 120 characters.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HouseholdName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors that can occur when parsing a [`Postcode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PostcodeError {
    /// The postcode is empty or only whitespace.
    #[error("postcode is required")]
    Empty,
    /// The postcode exceeds the column width.
    #[error("postcode must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A postal code.
///
/// Stored as entered (trimmed). The bin-schedule lookup normalizes further by
/// stripping inner whitespace, see [`crate::bin_schedule`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Postcode(String);

impl Postcode {
    /// Maximum length, matching `households.postcode VARCHAR(10)`.
    pub const MAX_LENGTH: usize = 10;

    /// Parse a `Postcode` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than 10 characters.
    pub fn parse(s: &str) -> Result<Self, PostcodeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PostcodeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(PostcodeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the postcode as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Postcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned for a non-positive occupant count.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("members must be a positive integer (got {0})")]
pub struct MembersError(pub i64);

/// Number of people living in a household. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Members(i32);

impl Members {
    /// Occupant count used when a registration omits it.
    pub const DEFAULT: Self = Self(1);

    /// Create an occupant count.
    ///
    /// # Errors
    ///
    /// Returns `MembersError` if `count` is zero, negative, or does not fit in an `i32`.
    pub fn new(count: i64) -> Result<Self, MembersError> {
        match i32::try_from(count) {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(MembersError(count)),
        }
    }

    /// Returns the count as stored in the database.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Default for Members {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i64> for Members {
    type Error = MembersError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Members> for i32 {
    fn from(members: Members) -> Self {
        members.0
    }
}
