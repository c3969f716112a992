use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::access;
use crate::database::models::{Bon, BonDetail, BonExportRow, BonInput, BonSummary, Intervention};
use crate::error::ApiError;
use crate::handlers::validate::{optional_text, RequiredFields};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{BonService, NewBon};
use crate::state::AppState;

/// GET /api/bons - Work orders newest first, each with the interventions
/// summary `{du, au, matricule, prenoms, binome}`
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<BonSummary>> {
    user.authorize(access::OFFICE)?;
    let bons = BonService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(bons))
}

/// GET /api/bons/:id
pub async fn get(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<BonDetail> {
    user.authorize(access::OFFICE)?;
    let detail = BonService::new(state.pool.clone()).detail(id).await?;
    Ok(ApiResponse::success(detail))
}

/// GET /api/bons/interventions/:bon_id
pub async fn interventions(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(bon_id): ApiPath<i64>,
) -> ApiResult<Vec<Intervention>> {
    user.authorize(access::OFFICE)?;
    let rows = BonService::new(state.pool.clone()).interventions(bon_id).await?;
    Ok(ApiResponse::success(rows))
}

/// GET /api/bons/export - One row per intervention with the validation label,
/// ready for the spreadsheet and PDF documents
pub async fn export(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<BonExportRow>> {
    user.authorize(access::OFFICE)?;
    let rows = BonService::new(state.pool.clone()).export().await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/bons
///
/// Expected Input:
/// ```json
/// {
///   "numero_bon": 1024,
///   "affaire": "AF-2024-01",
///   "client": "SODECI",
///   "designation_travaux": "Remplacement compresseur",
///   "date_recu": "2024-03-01",
///   "facturation": "Non",
///   "heure_total": "6",
///   "est_valide": false
/// }
/// ```
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<BonInput>,
) -> ApiResult<Bon> {
    user.authorize(access::BON_CREATORS)?;

    let mut required = RequiredFields::new();
    let new_bon = NewBon {
        numero_bon: required.value("numero_bon", body.numero_bon),
        affaire: required.text("affaire", body.affaire),
        client: required.text("client", body.client),
        designation_travaux: required.text("designation_travaux", body.designation_travaux),
        date_recu: required.text("date_recu", body.date_recu),
        facturation: required.text("facturation", body.facturation),
        heure_total: optional_text(body.heure_total),
        adresse: optional_text(body.adresse),
        est_valide: body.est_valide.unwrap_or(false),
        cree_par_formulaire: body.cree_par_formulaire.unwrap_or(true),
    };
    required.finish()?;

    let created = BonService::new(state.pool.clone()).create(&new_bon).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/bons/:id - Partial update, also used to set invoicing and validation
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<BonInput>,
) -> ApiResult<Bon> {
    user.authorize(access::BON_EDITORS)?;
    if body.is_empty() {
        return Err(ApiError::bad_request("No field to update"));
    }
    let updated = BonService::new(state.pool.clone()).update(id, body).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/bons/:id - Also removes its interventions and observations
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::BON_EDITORS)?;
    BonService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Work order deleted" })))
}
