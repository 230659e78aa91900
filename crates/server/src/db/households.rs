//! Household repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ecohome_core::{HouseholdId, HouseholdName, Members, Postcode};

use super::RepositoryError;
use crate::models::{Household, HouseholdChanges, NewHousehold};

const HOUSEHOLD_COLUMNS: &str = "id, name, postcode, members, created_at";

/// Raw `households` row before validation.
#[derive(sqlx::FromRow)]
struct HouseholdRow {
    id: HouseholdId,
    name: String,
    postcode: String,
    members: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<HouseholdRow> for Household {
    type Error = RepositoryError;

    fn try_from(row: HouseholdRow) -> Result<Self, Self::Error> {
        let name = HouseholdName::parse(&row.name).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid name for household {}: {e}", row.id))
        })?;
        let postcode = Postcode::parse(&row.postcode).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid postcode for household {}: {e}",
                row.id
            ))
        })?;
        let members = Members::new(i64::from(row.members)).map_err(|e| {
            RepositoryError::DataCorruption(format!(
                "invalid members for household {}: {e}",
                row.id
            ))
        })?;

        Ok(Self {
            id: row.id,
            name,
            postcode,
            members,
            created_at: row.created_at,
        })
    }
}

/// Repository for household database operations.
pub struct HouseholdRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> HouseholdRepository<'a> {
    /// Create a new household repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all households, most recently created first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn list(&self) -> Result<Vec<Household>, RepositoryError> {
        let rows: Vec<HouseholdRow> = sqlx::query_as(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Household::try_from).collect()
    }

    /// Get a household by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get(&self, id: HouseholdId) -> Result<Option<Household>, RepositoryError> {
        let row: Option<HouseholdRow> = sqlx::query_as(&format!(
            "SELECT {HOUSEHOLD_COLUMNS} FROM households WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Household::try_from).transpose()
    }

    /// Check whether a household exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: HouseholdId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM households WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Register a household.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a check constraint rejects a field.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, household: &NewHousehold) -> Result<Household, RepositoryError> {
        let row: HouseholdRow = sqlx::query_as(&format!(
            "INSERT INTO households (name, postcode, members) \
             VALUES ($1, $2, $3) \
             RETURNING {HOUSEHOLD_COLUMNS}"
        ))
        .bind(household.name.as_str())
        .bind(household.postcode.as_str())
        .bind(household.members.get())
        .fetch_one(self.pool)
        .await
        .map_err(super::map_write_error)?;

        Household::try_from(row)
    }

    /// Apply a partial update and return the updated household.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the household does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: HouseholdId,
        changes: &HouseholdChanges,
    ) -> Result<Household, RepositoryError> {
        let row: Option<HouseholdRow> = sqlx::query_as(&format!(
            "UPDATE households SET \
                name = COALESCE($2, name), \
                postcode = COALESCE($3, postcode), \
                members = COALESCE($4, members) \
             WHERE id = $1 \
             RETURNING {HOUSEHOLD_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name.as_ref().map(HouseholdName::as_str))
        .bind(changes.postcode.as_ref().map(Postcode::as_str))
        .bind(changes.members.map(Members::get))
        .fetch_optional(self.pool)
        .await
        .map_err(super::map_write_error)?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(Household::try_from)
    }

    /// Delete a household. Its usage entries are removed by the cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the household does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: HouseholdId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM households WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
