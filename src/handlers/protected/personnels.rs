use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::access;
use crate::database::models::{Personnel, PersonnelInput, Technicien};
use crate::error::ApiError;
use crate::handlers::sync_status::SyncStatus;
use crate::handlers::validate::RequiredFields;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{PersonnelFields, PersonnelService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PersonnelSyncRequest {
    #[serde(default)]
    pub personnels: Option<Vec<PersonnelInput>>,
}

/// GET /api/personnels
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Personnel>> {
    user.authorize(access::OFFICE)?;
    let rows = PersonnelService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/personnels/techniciens - Technicians for the intervention form
pub async fn techniciens(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Technicien>> {
    user.authorize(access::OFFICE)?;
    let rows = PersonnelService::new(state.pool.clone()).techniciens().await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/personnels
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<PersonnelInput>,
) -> ApiResult<Personnel> {
    user.authorize(access::PERSONNEL_WRITERS)?;
    let fields = personnel_fields(body)?;
    let created = PersonnelService::new(state.pool.clone()).create(&fields).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/personnels/:id - All four fields are required
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<PersonnelInput>,
) -> ApiResult<Personnel> {
    user.authorize(access::PERSONNEL_WRITERS)?;
    let fields = personnel_fields(body)?;
    let updated = PersonnelService::new(state.pool.clone()).update(id, &fields).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/personnels/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::PERSONNEL_WRITERS)?;
    PersonnelService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Personnel deleted" })))
}

/// POST /api/personnels/sync - Bulk upsert from the mobile application
pub async fn sync(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<PersonnelSyncRequest>,
) -> Result<Response, ApiError> {
    user.authorize(access::PERSONNEL_WRITERS)?;

    let personnels = body.personnels.unwrap_or_default();
    if personnels.is_empty() {
        return Ok(SyncStatus::error("No personnel to synchronize").with_status(StatusCode::BAD_REQUEST));
    }

    let response = match PersonnelService::new(state.pool.clone()).sync(&personnels).await {
        Ok(count) => Json(SyncStatus::success(format!("{} personnels synchronized", count))).into_response(),
        Err(e) => {
            error!("Personnel sync failed: {}", e);
            SyncStatus::error("Personnel synchronization failed").with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(response)
}

fn personnel_fields(body: PersonnelInput) -> Result<PersonnelFields, ApiError> {
    let mut required = RequiredFields::new();
    let fields = PersonnelFields {
        matricule: required.text("matricule", body.matricule),
        nom: required.text("nom", body.nom),
        prenoms: required.text("prenoms", body.prenoms),
        fonction: required.text("fonction", body.fonction),
    };
    required.finish()?;
    Ok(fields)
}
