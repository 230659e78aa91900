//! CSV export and import of usage entries.
//!
//! Exports have the header `id,entry_type,value,recorded_at` with values to
//! two decimals and RFC 3339 UTC timestamps, ordered oldest first.
//!
//! Imports match columns by header name. `entry_type` and `value` are
//! required; `recorded_at` is optional and a blank cell means "now". Any
//! other column (such as an exported `id`) is ignored, so an export can be
//! imported into another household unchanged. Every row is validated before
//! anything is written, and the inserts share one transaction.

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use sqlx::PgPool;
use thiserror::Error;

use ecohome_core::{EntryType, HouseholdId, UsageValue};

use crate::db::{RepositoryError, UsageRepository};
use crate::models::{NewUsageEntry, UsageEntry};
use crate::timestamp::parse_timestamp;

/// Export column order.
pub const EXPORT_HEADER: [&str; 4] = ["id", "entry_type", "value", "recorded_at"];

/// Errors that abort an import. Nothing is written when any of these occur.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The body contained no CSV at all.
    #[error("CSV data required")]
    Empty,

    /// The text is not well-formed CSV.
    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header row lacks a required column.
    #[error("missing required column \"{0}\"")]
    MissingColumn(&'static str),

    /// A data row failed validation.
    #[error("row {line}: {message}")]
    Row { line: u64, message: String },

    /// The database rejected a row.
    #[error("row {line}: {source}")]
    Insert {
        line: u64,
        #[source]
        source: RepositoryError,
    },

    /// The transaction could not be started or committed.
    #[error("transaction failed: {0}")]
    Transaction(#[source] RepositoryError),
}

/// A validated row and the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub line: u64,
    pub entry: NewUsageEntry,
}

/// Render entries as CSV.
///
/// # Errors
///
/// Returns `csv::Error` if writing to the buffer fails.
pub fn write_csv(entries: &[UsageEntry]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER)?;

    for entry in entries {
        writer.write_record([
            entry.id.to_string(),
            entry.entry_type.to_string(),
            entry.value.to_string(),
            entry.recorded_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Column positions resolved from the header row.
struct Columns {
    entry_type: usize,
    value: usize,
    recorded_at: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, ImportError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
        };

        Ok(Self {
            entry_type: find("entry_type").ok_or(ImportError::MissingColumn("entry_type"))?,
            value: find("value").ok_or(ImportError::MissingColumn("value"))?,
            recorded_at: find("recorded_at"),
        })
    }
}

/// Parse and validate every row of an import.
///
/// Rows whose cells are all blank are skipped. `now` fills blank
/// `recorded_at` cells.
///
/// # Errors
///
/// Returns the first problem found; see [`ImportError`].
pub fn parse_csv(
    text: &str,
    household_id: HouseholdId,
    now: DateTime<Utc>,
) -> Result<Vec<ParsedRow>, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let columns = Columns::from_headers(reader.headers()?)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map_or(0, csv::Position::line);
        let row_error = |message: String| ImportError::Row { line, message };
        let cell = |index: usize| record.get(index).unwrap_or_default();

        let entry_type = cell(columns.entry_type)
            .parse::<EntryType>()
            .map_err(|e| row_error(e.to_string()))?;
        let value = UsageValue::parse(cell(columns.value)).map_err(|e| row_error(e.to_string()))?;
        let recorded_at = match columns.recorded_at.map(cell) {
            Some(raw) if !raw.is_empty() => {
                parse_timestamp(raw).map_err(|e| row_error(e.to_string()))?
            }
            _ => now,
        };

        rows.push(ParsedRow {
            line,
            entry: NewUsageEntry {
                household_id,
                entry_type,
                value,
                recorded_at,
            },
        });
    }

    Ok(rows)
}

/// Import CSV text into a household in a single transaction.
///
/// Returns the number of entries stored.
///
/// # Errors
///
/// Returns `ImportError` if any row is invalid or cannot be inserted; the
/// transaction is rolled back and no entries are stored.
pub async fn import_csv(
    pool: &PgPool,
    household_id: HouseholdId,
    text: &str,
    now: DateTime<Utc>,
) -> Result<u64, ImportError> {
    let rows = parse_csv(text, household_id, now).inspect_err(|e| {
        tracing::warn!(household_id = %household_id, error = %e, "CSV import rejected");
    })?;

    let entries: Vec<NewUsageEntry> = rows.iter().map(|row| row.entry).collect();

    let count = UsageRepository::new(pool)
        .insert_batch(&entries)
        .await
        .map_err(|(index, source)| {
            let err = match index.and_then(|index| rows.get(index)) {
                Some(row) => ImportError::Insert {
                    line: row.line,
                    source,
                },
                None => ImportError::Transaction(source),
            };
            tracing::warn!(household_id = %household_id, error = %err, "CSV import rolled back");
            err
        })?;

    tracing::info!(household_id = %household_id, count, "CSV import committed");
    Ok(count)
}
