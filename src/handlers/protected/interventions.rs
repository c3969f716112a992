use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::access;
use crate::database::models::{Intervention, InterventionInput, InterventionListing};
use crate::error::ApiError;
use crate::handlers::sync_status::SyncStatus;
use crate::handlers::validate::{optional_text, RequiredFields};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{InterventionFields, InterventionService};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InterventionSyncRequest {
    #[serde(default)]
    pub interventions: Option<Vec<InterventionInput>>,
}

/// GET /api/interventions - Joined with the fields of each bon
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<InterventionListing>> {
    user.authorize(access::INTERVENTION_READERS)?;
    let rows = InterventionService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/interventions
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<InterventionInput>,
) -> ApiResult<Intervention> {
    user.authorize(access::INTERVENTION_CREATORS)?;
    let fields = intervention_fields(body)?;
    let created = InterventionService::new(state.pool.clone()).create(&fields).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/interventions/:id - Full replacement
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<InterventionInput>,
) -> ApiResult<Intervention> {
    user.authorize(access::INTERVENTION_EDITORS)?;
    let fields = intervention_fields(body)?;
    let updated = InterventionService::new(state.pool.clone()).replace(id, &fields).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/interventions/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::INTERVENTION_EDITORS)?;
    InterventionService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Intervention deleted" })))
}

/// POST /api/interventions/sync
///
/// Expected Input:
/// ```json
/// { "interventions": [ { "id": 12, "bon_id": 3, "du": "2024-03-02", "matricule": "T01", ... } ] }
/// ```
pub async fn sync(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<InterventionSyncRequest>,
) -> Result<Response, ApiError> {
    user.authorize(access::INTERVENTION_CREATORS)?;

    let interventions = body.interventions.unwrap_or_default();
    if interventions.is_empty() {
        return Ok(SyncStatus::error("No intervention to synchronize").with_status(StatusCode::BAD_REQUEST));
    }

    let response = match InterventionService::new(state.pool.clone()).sync(&interventions).await {
        Ok(count) => Json(SyncStatus::success(format!("{} interventions synchronized", count))).into_response(),
        Err(e) => {
            error!("Intervention sync failed: {}", e);
            SyncStatus::error("Intervention synchronization failed").with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(response)
}

fn intervention_fields(body: InterventionInput) -> Result<InterventionFields, ApiError> {
    let mut required = RequiredFields::new();
    let fields = InterventionFields {
        bon_id: required.value("bon_id", body.bon_id),
        du: required.text("du", body.du),
        au: required.text("au", body.au),
        matricule: required.text("matricule", body.matricule),
        prenoms: required.text("prenoms", body.prenoms),
        binome: optional_text(body.binome),
        heure_debut: required.text("heure_debut", body.heure_debut),
        heure_fin: required.text("heure_fin", body.heure_fin),
        total_heures: optional_text(body.total_heures),
        description_detail: required.text("description_detail", body.description_detail),
        observation_detail: optional_text(body.observation_detail),
    };
    required.finish()?;
    Ok(fields)
}
