//! Non-negative usage quantity with two-decimal precision.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`UsageValue`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The input is not a finite number.
    #[error("value must be numeric (got \"{0}\")")]
    NotANumber(String),
    /// The value is below zero.
    #[error("value must not be negative")]
    Negative,
    /// The value does not fit `NUMERIC(10, 2)`.
    #[error("value must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// Quantity recorded by a usage entry (litres for water, kWh for energy).
///
/// Rounded to two decimal places on construction so the in-memory value is
/// the one `NUMERIC(10, 2)` will store. Serializes as a JSON number.
///
/// ```
/// use ecohome_core::UsageValue;
///
/// assert_eq!(UsageValue::parse("12.345").unwrap().to_string(), "12.35");
/// assert!(UsageValue::parse("-1").is_err());
/// assert!(UsageValue::parse("abc").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "f64")]
pub struct UsageValue(Decimal);

impl UsageValue {
    /// Decimal places kept.
    pub const SCALE: u32 = 2;

    /// Exclusive upper bound (`10^8`, eight integer digits).
    pub const MAX: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

    /// Zero usage.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate and round a decimal.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::Negative` below zero and `ValueError::TooLarge` at or above `10^8`.
    pub fn new(value: Decimal) -> Result<Self, ValueError> {
        let mut rounded =
            value.round_dp_with_strategy(Self::SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(Self::SCALE);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(ValueError::Negative);
        }
        if rounded >= Self::MAX {
            return Err(ValueError::TooLarge { max: Self::MAX });
        }
        // Normalizes "-0.00" to "0.00".
        Ok(Self(rounded.abs()))
    }

    /// Parse a value from text such as a CSV cell or form field.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::NotANumber` if the text is not a decimal, otherwise as [`Self::new`].
    pub fn parse(s: &str) -> Result<Self, ValueError> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|_| ValueError::NotANumber(s.to_owned()))?;
        Self::new(value)
    }

    /// Returns the exact decimal value.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Returns the value as a float for scoring arithmetic.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.0.to_f64().unwrap_or(0.0)
    }
}

impl fmt::Display for UsageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for UsageValue {
    type Error = ValueError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UsageValue> for f64 {
    fn from(value: UsageValue) -> Self {
        value.to_f64()
    }
}

impl From<UsageValue> for Decimal {
    fn from(value: UsageValue) -> Self {
        value.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for UsageValue {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for UsageValue {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let decimal = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(decimal)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for UsageValue {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_half_away_from_zero() {
        let value = UsageValue::parse("1.005").unwrap();
        assert_eq!(value.as_decimal().scale(), 2);
        assert_eq!(value.to_string(), "1.01");
        assert_eq!(UsageValue::parse("150").unwrap().to_string(), "150.00");
    }

    #[test]
    fn test_rejects_negative_and_text() {
        assert_eq!(UsageValue::parse("-0.5"), Err(ValueError::Negative));
        assert!(matches!(
            UsageValue::parse("twelve"),
            Err(ValueError::NotANumber(_))
        ));
        assert!(matches!(
            UsageValue::parse("NaN"),
            Err(ValueError::NotANumber(_))
        ));
    }

    #[test]
    fn test_tiny_negative_rounds_to_zero() {
        assert_eq!(UsageValue::parse("-0.001").unwrap(), UsageValue::ZERO);
    }

    #[test]
    fn test_upper_bound() {
        assert!(UsageValue::parse("99999999.99").is_ok());
        assert!(matches!(
            UsageValue::parse("100000000"),
            Err(ValueError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_json_number_and_string_inputs() {
        let from_number: UsageValue = serde_json::from_str("12.5").unwrap();
        let from_string: UsageValue = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "12.5");
        assert!(serde_json::from_str::<UsageValue>("-3").is_err());
    }
}
