use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::access;
use crate::database::models::{Observation, ObservationInput};
use crate::error::ApiError;
use crate::handlers::validate::{optional_text, RequiredFields};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::ObservationService;
use crate::state::AppState;
use crate::types::ObservationStatus;

/// GET /api/observations - HSE/HSSE observations, latest first
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Observation>> {
    user.authorize(access::OFFICE)?;
    let rows = ObservationService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/observations
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ObservationInput>,
) -> ApiResult<Observation> {
    user.authorize(access::OBSERVATION_WRITERS)?;

    let mut required = RequiredFields::new();
    let input = ObservationInput {
        date: Some(required.text("date", body.date)),
        observateur: Some(required.text("observateur", body.observateur)),
        kind: Some(required.text("type", body.kind)),
        description: Some(required.text("description", body.description)),
        gravite: Some(required.text("gravite", body.gravite)),
        statut: Some(required.text("statut", body.statut)),
        chantier: Some(required.text("chantier", body.chantier)),
        id: None,
        bon_id: body.bon_id,
        tool_box_details: optional_text(body.tool_box_details),
        tool_box_responsable: optional_text(body.tool_box_responsable),
        rapport_incident: optional_text(body.rapport_incident),
        suivi_dechets_details: optional_text(body.suivi_dechets_details),
        suivi_dechets_responsable: optional_text(body.suivi_dechets_responsable),
        hsse: optional_text(body.hsse),
        environnement: optional_text(body.environnement),
    };
    required.finish()?;
    ObservationStatus::normalize(input.statut.as_deref())?;

    let created = ObservationService::new(state.pool.clone()).create(&input).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/observations/:id - Blank fields are left unchanged
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(mut body): ApiJson<ObservationInput>,
) -> ApiResult<Observation> {
    user.authorize(access::OBSERVATION_WRITERS)?;

    if ObservationService::changes(body.clone()).is_empty() {
        return Err(ApiError::bad_request("No field to update"));
    }
    body.statut = ObservationStatus::normalize(body.statut.as_deref())?.map(str::to_string);

    let updated = ObservationService::new(state.pool.clone()).update(id, body).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/observations/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::OBSERVATION_WRITERS)?;
    ObservationService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Observation deleted" })))
}
