//! Household route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use tracing::instrument;

use ecohome_core::{HouseholdId, HouseholdName, Members, Postcode};

use super::{MessageResponse, not_found_as};
use crate::db::HouseholdRepository;
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::models::{Household, HouseholdChanges, NewHousehold};
use crate::services::dashboard::{Dashboard, load_dashboard};
use crate::state::AppState;

/// Body of `POST /api/households`.
#[derive(Debug, Deserialize)]
pub struct CreateHouseholdRequest {
    pub name: Option<String>,
    pub postcode: Option<String>,
    pub members: Option<i64>,
}

impl TryFrom<CreateHouseholdRequest> for NewHousehold {
    type Error = AppError;

    fn try_from(req: CreateHouseholdRequest) -> Result<Self> {
        let (Some(name), Some(postcode)) = (req.name, req.postcode) else {
            return Err(AppError::BadRequest(
                "Name and postcode are required".to_owned(),
            ));
        };

        Ok(Self {
            name: HouseholdName::parse(&name)?,
            postcode: Postcode::parse(&postcode)?,
            members: req.members.map(Members::new).transpose()?.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /api/households/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateHouseholdRequest {
    pub name: Option<String>,
    pub postcode: Option<String>,
    pub members: Option<i64>,
}

impl TryFrom<UpdateHouseholdRequest> for HouseholdChanges {
    type Error = AppError;

    fn try_from(req: UpdateHouseholdRequest) -> Result<Self> {
        let changes = Self {
            name: req.name.as_deref().map(HouseholdName::parse).transpose()?,
            postcode: req.postcode.as_deref().map(Postcode::parse).transpose()?,
            members: req.members.map(Members::new).transpose()?,
        };

        if changes.is_empty() {
            return Err(AppError::BadRequest("No fields to update".to_owned()));
        }
        Ok(changes)
    }
}

/// Body of `GET /api/households`.
#[derive(Debug, Serialize)]
pub struct HouseholdList {
    pub households: Vec<Household>,
}

/// List households, newest first.
#[instrument(skip_all)]
pub async fn index(State(state): State<AppState>) -> Result<Json<HouseholdList>> {
    let households = HouseholdRepository::new(state.pool()).list().await?;
    Ok(Json(HouseholdList { households }))
}

/// Household dashboard: recent entries, totals, score and tips.
#[instrument(skip_all, fields(household_id = %id))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<HouseholdId>,
) -> Result<Json<Dashboard>> {
    load_dashboard(state.pool(), id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound("Household"))
}

/// Register a household.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateHouseholdRequest>,
) -> Result<impl IntoResponse> {
    let new_household = NewHousehold::try_from(req)?;
    let household = HouseholdRepository::new(state.pool())
        .create(&new_household)
        .await?;

    tracing::info!(household_id = %household.id, "Household created");
    Ok((StatusCode::CREATED, Json(household)))
}

/// Partially update a household.
#[instrument(skip_all, fields(household_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<HouseholdId>,
    ApiJson(req): ApiJson<UpdateHouseholdRequest>,
) -> Result<Json<Household>> {
    let changes = HouseholdChanges::try_from(req)?;
    let household = HouseholdRepository::new(state.pool())
        .update(id, &changes)
        .await
        .map_err(|e| not_found_as(e, "Household"))?;

    Ok(Json(household))
}

/// Delete a household and, by cascade, all of its entries.
#[instrument(skip_all, fields(household_id = %id))]
pub async fn destroy(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<HouseholdId>,
) -> Result<Json<MessageResponse>> {
    HouseholdRepository::new(state.pool())
        .delete(id)
        .await
        .map_err(|e| not_found_as(e, "Household"))?;

    tracing::info!("Household deleted");
    Ok(Json(MessageResponse::new("Household deleted")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn create_request(json: serde_json::Value) -> Result<NewHousehold> {
        NewHousehold::try_from(serde_json::from_value::<CreateHouseholdRequest>(json).unwrap())
    }

    #[test]
    fn test_create_defaults_members_to_one() {
        let household = create_request(serde_json::json!({
            "name": " The Smiths ",
            "postcode": "6000",
        }))
        .unwrap();
        assert_eq!(household.name.as_str(), "The Smiths");
        assert_eq!(household.members.get(), 1);
    }

    #[test]
    fn test_create_requires_name_and_postcode() {
        let err = create_request(serde_json::json!({ "name": "Smiths" })).unwrap_err();
        assert_eq!(err.to_string(), "Name and postcode are required");
        assert!(create_request(serde_json::json!({ "name": "  ", "postcode": "6000" })).is_err());
    }

    #[test]
    fn test_create_rejects_non_positive_members() {
        let json = serde_json::json!({ "name": "Smiths", "postcode": "6000", "members": 0 });
        assert!(matches!(create_request(json), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_update_requires_a_field() {
        let req: UpdateHouseholdRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(matches!(
            HouseholdChanges::try_from(req),
            Err(AppError::BadRequest(_))
        ));

        let req: UpdateHouseholdRequest =
            serde_json::from_value(serde_json::json!({ "members": 4 })).unwrap();
        let changes = HouseholdChanges::try_from(req).unwrap();
        assert_eq!(changes.members.map(Members::get), Some(4));
        assert!(changes.name.is_none());
    }
}
