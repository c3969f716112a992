use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::access;
use crate::database::models::FieldBon;
use crate::error::ApiError;
use crate::handlers::sync_status::SyncStatus;
use crate::middleware::{ApiJson, AuthUser};
use crate::services::SyncService;
use crate::state::AppState;
use crate::types::ObservationStatus;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BonSyncRequest {
    #[serde(default)]
    pub bons_de_travail: Option<Vec<FieldBon>>,
}

/// POST /api/sync/bon-de-travail - Upload from the mobile application
///
/// Each bon is upserted by `id`, then its interventions and observations by
/// their own ids. The whole batch is applied or none of it is. Observation
/// statuses are checked before anything is written; an empty list is a no-op.
///
/// Expected Input:
/// ```json
/// {
///   "bonsDeTravail": [
///     {
///       "id": 58,
///       "numero_bon": 1024,
///       "affaire": "AF-2024-01",
///       "client": "SODECI",
///       "interventions": [ { "id": 7, "du": "2024-03-02", "matricule": "T01" } ],
///       "observations": [ { "id": 3, "type": "Electrique", "statut": "Non traitée" } ]
///     }
///   ]
/// }
/// ```
pub async fn bons(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<BonSyncRequest>,
) -> Result<Response, ApiError> {
    user.authorize(access::FIELD_SYNC)?;

    let Some(mut bons) = body.bons_de_travail else {
        return Ok(SyncStatus::error("bonsDeTravail must be a list").with_status(StatusCode::BAD_REQUEST));
    };

    for observation in bons.iter_mut().flat_map(|b| b.observations.iter_mut().flatten()) {
        match ObservationStatus::normalize(observation.statut.as_deref()) {
            Ok(statut) => observation.statut = statut.map(str::to_string),
            Err(e) => {
                warn!("Bon upload from {} refused: {}", user.matricule, e);
                return Ok(SyncStatus::error(e.to_string()).with_status(StatusCode::BAD_REQUEST));
            }
        }
    }

    let response = match SyncService::new(state.pool.clone()).sync_bons(&bons).await {
        Ok(count) => {
            info!("{} synchronized {} bons", user.matricule, count);
            Json(SyncStatus::success(format!("{} bons synchronized", count))).into_response()
        }
        Err(e) => {
            error!("Bon sync from {} failed: {}", user.matricule, e);
            SyncStatus::error("Work order synchronization failed").with_status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };
    Ok(response)
}
