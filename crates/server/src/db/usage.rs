//! Usage entry repository for database operations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ecohome_core::{EntryType, HouseholdId, ScoredEntry, UsageEntryId};

use super::{RepositoryError, map_write_error};
use crate::models::{NewUsageEntry, UsageChanges, UsageEntry, UsageSummary};

const ENTRY_COLUMNS: &str = "id, household_id, entry_type, value, recorded_at";

/// Number of entries shown on the dashboard.
pub const RECENT_LIMIT: i64 = 50;

/// Repository for usage entry database operations.
pub struct UsageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UsageRepository<'a> {
    /// Create a new usage repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: UsageEntryId) -> Result<Option<UsageEntry>, RepositoryError> {
        let entry = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM usage_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(entry)
    }

    /// Record a reading.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the household does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, entry: &NewUsageEntry) -> Result<UsageEntry, RepositoryError> {
        sqlx::query_as(&format!(
            "INSERT INTO usage_entries (household_id, entry_type, value, recorded_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(entry.household_id)
        .bind(entry.entry_type)
        .bind(entry.value)
        .bind(entry.recorded_at)
        .fetch_one(self.pool)
        .await
        .map_err(map_write_error)
    }

    /// Apply a partial update and return the updated entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: UsageEntryId,
        changes: &UsageChanges,
    ) -> Result<UsageEntry, RepositoryError> {
        let entry: Option<UsageEntry> = sqlx::query_as(&format!(
            "UPDATE usage_entries SET \
                entry_type = COALESCE($2, entry_type), \
                value = COALESCE($3, value), \
                recorded_at = COALESCE($4, recorded_at) \
             WHERE id = $1 \
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.entry_type)
        .bind(changes.value)
        .bind(changes.recorded_at)
        .fetch_optional(self.pool)
        .await
        .map_err(map_write_error)?;

        entry.ok_or(RepositoryError::NotFound)
    }

    /// Delete an entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the entry does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: UsageEntryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM usage_entries WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// The most recent entries for a household, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn recent_for_household(
        &self,
        household_id: HouseholdId,
    ) -> Result<Vec<UsageEntry>, RepositoryError> {
        let entries = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM usage_entries \
             WHERE household_id = $1 \
             ORDER BY recorded_at DESC, id DESC \
             LIMIT $2"
        ))
        .bind(household_id)
        .bind(RECENT_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Lifetime totals per category for a household.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals_for_household(
        &self,
        household_id: HouseholdId,
    ) -> Result<UsageSummary, RepositoryError> {
        let rows: Vec<(EntryType, Decimal)> = sqlx::query_as(
            "SELECT entry_type, SUM(value) AS total \
             FROM usage_entries \
             WHERE household_id = $1 \
             GROUP BY entry_type",
        )
        .bind(household_id)
        .fetch_all(self.pool)
        .await?;

        let mut summary = UsageSummary::default();
        for (entry_type, total) in rows {
            summary.set(entry_type, total);
        }
        Ok(summary)
    }

    /// Entries recorded at or after `since`, in the shape the score calculator takes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn window_for_household(
        &self,
        household_id: HouseholdId,
        since: DateTime<Utc>,
    ) -> Result<Vec<ScoredEntry>, RepositoryError> {
        let entries = sqlx::query_as(
            "SELECT entry_type, value, recorded_at \
             FROM usage_entries \
             WHERE household_id = $1 AND recorded_at >= $2",
        )
        .bind(household_id)
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Every entry for a household, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all_for_household(
        &self,
        household_id: HouseholdId,
    ) -> Result<Vec<UsageEntry>, RepositoryError> {
        let entries = sqlx::query_as(&format!(
            "SELECT {ENTRY_COLUMNS} FROM usage_entries \
             WHERE household_id = $1 \
             ORDER BY recorded_at ASC, id ASC"
        ))
        .bind(household_id)
        .fetch_all(self.pool)
        .await?;

        Ok(entries)
    }

    /// Insert many entries in a single transaction.
    ///
    /// Either every entry is stored or none is: the transaction is rolled
    /// back on the first failure (or when dropped without commit). Rows
    /// inserted before a failing one, such as an entry whose household was
    /// deleted mid-batch, are discarded with it.
    ///
    /// # Errors
    ///
    /// Returns `(Some(index), error)` for the first entry that failed, or
    /// `(None, error)` if the transaction could not be started or committed.
    pub async fn insert_batch(
        &self,
        entries: &[NewUsageEntry],
    ) -> Result<u64, (Option<usize>, RepositoryError)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| (None, RepositoryError::Database(e)))?;

        let mut inserted = 0;
        for (index, entry) in entries.iter().enumerate() {
            sqlx::query(
                "INSERT INTO usage_entries (household_id, entry_type, value, recorded_at) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(entry.household_id)
            .bind(entry.entry_type)
            .bind(entry.value)
            .bind(entry.recorded_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| (Some(index), map_write_error(e)))?;
            inserted += 1;
        }

        tx.commit()
            .await
            .map_err(|e| (None, RepositoryError::Database(e)))?;

        Ok(inserted)
    }
}
