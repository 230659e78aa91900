//! Newtype IDs for households and usage entries.

/// Defines an ID for a table keyed by a `SERIAL` column.
///
/// Postgres `SERIAL` is a 4-byte integer, so the wrapper holds an `i32` and
/// encodes to `INT4` under the `postgres` feature. IDs serialize as bare JSON
/// numbers and print as the number, which is what path segments and export
/// rows carry. Each table gets its own type so a usage-entry ID cannot be
/// passed where a household ID is expected.
macro_rules! serial_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value).map(Self)
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

serial_id!(
    /// Primary key of `households`.
    HouseholdId
);
serial_id!(
    /// Primary key of `usage_entries`.
    UsageEntryId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_a_bare_json_number() {
        assert_eq!(serde_json::to_string(&HouseholdId::new(42)).unwrap(), "42");

        let parsed: UsageEntryId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, UsageEntryId::new(7));
        assert!(serde_json::from_str::<UsageEntryId>("\"7\"").is_err());
    }

    #[test]
    fn test_id_displays_as_number() {
        assert_eq!(UsageEntryId::new(13).to_string(), "13");
        assert_eq!(format!("usage_{}.csv", HouseholdId::new(5)), "usage_5.csv");
    }
}
