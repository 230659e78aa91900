//! Usage entry route handlers, including CSV export and import.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use ecohome_core::{EntryType, HouseholdId, UsageEntryId, UsageValue};

use super::{MessageResponse, not_found_as};
use crate::db::{HouseholdRepository, UsageRepository};
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::models::{NewUsageEntry, UsageChanges, UsageEntry};
use crate::services::usage_csv::{import_csv, write_csv};
use crate::state::AppState;
use crate::timestamp::parse_timestamp;

/// Body of `POST /api/usage`.
#[derive(Debug, Deserialize)]
pub struct CreateUsageRequest {
    pub household_id: Option<HouseholdId>,
    pub entry_type: Option<String>,
    /// A JSON number or a numeric string.
    pub value: Option<Value>,
    pub recorded_at: Option<String>,
}

/// Body of `PUT /api/usage/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUsageRequest {
    pub entry_type: Option<String>,
    pub value: Option<Value>,
    pub recorded_at: Option<String>,
}

/// JSON form of an import body.
#[derive(Debug, Deserialize)]
struct ImportRequest {
    csv_data: Option<String>,
}

/// Body of a successful import.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: &'static str,
    pub count: u64,
}

fn parse_value(raw: &Value) -> Result<UsageValue> {
    let value = match raw {
        Value::Number(n) => UsageValue::parse(&n.to_string())?,
        Value::String(s) => UsageValue::parse(s)?,
        other => {
            return Err(AppError::BadRequest(format!(
                "value must be numeric (got {other})"
            )));
        }
    };
    Ok(value)
}

/// Parse an optional timestamp; blank means "not given".
fn parse_recorded_at(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(Some(parse_timestamp(s)?)),
        _ => Ok(None),
    }
}

impl CreateUsageRequest {
    fn into_new_entry(self, now: DateTime<Utc>) -> Result<NewUsageEntry> {
        let (Some(household_id), Some(entry_type), Some(value)) =
            (self.household_id, self.entry_type, self.value.filter(|v| !v.is_null()))
        else {
            return Err(AppError::BadRequest("Missing required fields".to_owned()));
        };

        Ok(NewUsageEntry {
            household_id,
            entry_type: entry_type.parse::<EntryType>()?,
            value: parse_value(&value)?,
            recorded_at: parse_recorded_at(self.recorded_at.as_deref())?.unwrap_or(now),
        })
    }
}

impl TryFrom<UpdateUsageRequest> for UsageChanges {
    type Error = AppError;

    fn try_from(req: UpdateUsageRequest) -> Result<Self> {
        let changes = Self {
            entry_type: req
                .entry_type
                .as_deref()
                .map(str::parse::<EntryType>)
                .transpose()?,
            value: req.value.as_ref().map(parse_value).transpose()?,
            recorded_at: parse_recorded_at(req.recorded_at.as_deref())?,
        };

        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_owned()));
        }
        Ok(changes)
    }
}

/// Record a reading.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUsageRequest>,
) -> Result<impl IntoResponse> {
    let new_entry = req.into_new_entry(Utc::now())?;
    let entry = UsageRepository::new(state.pool())
        .create(&new_entry)
        .await
        .map_err(|e| not_found_as(e, "Household"))?;

    tracing::info!(
        entry_id = %entry.id,
        household_id = %entry.household_id,
        entry_type = %entry.entry_type,
        "Usage entry recorded"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Fetch one entry.
#[instrument(skip_all, fields(entry_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UsageEntryId>,
) -> Result<Json<UsageEntry>> {
    UsageRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Entry"))
}

/// Partially update an entry.
#[instrument(skip_all, fields(entry_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UsageEntryId>,
    ApiJson(req): ApiJson<UpdateUsageRequest>,
) -> Result<Json<UsageEntry>> {
    let changes = UsageChanges::try_from(req)?;
    let entry = UsageRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| not_found_as(e, "Entry"))?;

    Ok(Json(entry))
}

/// Delete an entry.
#[instrument(skip_all, fields(entry_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UsageEntryId>,
) -> Result<Json<MessageResponse>> {
    UsageRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_as(e, "Entry"))?;

    Ok(Json(MessageResponse::new("Entry deleted")))
}

/// Download every entry of a household as CSV.
#[instrument(skip_all, fields(household_id = %household_id))]
pub async fn export(
    State(state): State<AppState>,
    ApiPath(household_id): ApiPath<HouseholdId>,
) -> Result<impl IntoResponse> {
    if !HouseholdRepository::new(state.pool())
        .exists(household_id)
        .await?
    {
        return Err(AppError::NotFound("Household"));
    }

    let entries = UsageRepository::new(state.pool())
        .all_for_household(household_id)
        .await?;
    let body = write_csv(&entries).map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!(rows = entries.len(), "CSV export");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=usage_{household_id}.csv"),
            ),
        ],
        body,
    ))
}

/// Import CSV into a household.
///
/// The body is the CSV text itself, or `{"csv_data": "..."}` when sent as
/// `application/json`.
#[instrument(skip_all, fields(household_id = %household_id))]
pub async fn import(
    State(state): State<AppState>,
    ApiPath(household_id): ApiPath<HouseholdId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ImportResponse>> {
    let text = import_text(&headers, &body)?;

    if !HouseholdRepository::new(state.pool())
        .exists(household_id)
        .await?
    {
        return Err(AppError::NotFound("Household"));
    }

    let count = import_csv(state.pool(), household_id, &text, Utc::now()).await?;

    Ok(Json(ImportResponse {
        message: "Import successful",
        count,
    }))
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Extract the CSV text from an import request body.
fn import_text(headers: &HeaderMap, body: &[u8]) -> Result<String> {
    if is_json(headers) {
        let req: ImportRequest = serde_json::from_slice(body)
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
        return req
            .csv_data
            .filter(|csv| !csv.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("CSV data required".to_owned()));
    }

    String::from_utf8(body.to_vec())
        .map_err(|_| AppError::BadRequest("CSV body must be UTF-8 text".to_owned()))
}
