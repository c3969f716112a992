use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::access;
use crate::database::models::{AffaireUpdateInput, Client, ClientAffaireInput, ClientInput, ClientWithAffaires};
use crate::handlers::validate::{optional_text, RequiredFields};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::client_service::{AffaireUpdated, ClientAffaireCreated};
use crate::services::{AffaireFields, ClientFields, ClientService, NewClientAffaire};
use crate::state::AppState;

/// GET /api/clients-affaires
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<ClientWithAffaires>> {
    user.authorize(access::OFFICE)?;
    let clients = ClientService::new(state.pool.clone()).list_with_affaires().await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients-affaires
///
/// Reuses the client with the same name when there is one, then opens the
/// affaire for it.
///
/// Expected Input:
/// ```json
/// { "nom": "SODECI", "contact": "0102030405", "adresse": "Plateau", "numero": "AF-2024-07" }
/// ```
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<ClientAffaireInput>,
) -> ApiResult<ClientAffaireCreated> {
    user.authorize(access::CLIENT_WRITERS)?;

    let mut required = RequiredFields::new();
    let input = NewClientAffaire {
        nom: required.text("nom", body.nom),
        numero: required.text("numero", body.numero),
        contact: optional_text(body.contact),
        adresse: optional_text(body.adresse),
        designation: optional_text(body.designation),
        statut: optional_text(body.statut),
    };
    required.finish()?;

    let created = ClientService::new(state.pool.clone()).create(&input).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/clients-affaires/affaires/:id
///
/// The client is rewritten too when `clientId` and all three client fields
/// are sent.
pub async fn update_affaire(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<AffaireUpdateInput>,
) -> ApiResult<AffaireUpdated> {
    user.authorize(access::CLIENT_WRITERS)?;

    let mut required = RequiredFields::new();
    let fields = AffaireFields {
        numero: required.text("numero", body.numero),
        designation: required.text("designation", body.designation),
        statut: required.text("statut", body.statut),
    };
    required.finish()?;

    let client = match (
        body.client_id,
        optional_text(body.client_nom),
        optional_text(body.client_contact),
        optional_text(body.client_adresse),
    ) {
        (Some(client_id), Some(nom), Some(contact), Some(adresse)) => {
            Some((client_id, ClientFields { nom, contact, adresse }))
        }
        _ => None,
    };

    let updated = ClientService::new(state.pool.clone())
        .update_affaire(id, &fields, client)
        .await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/clients-affaires/affaires/:id
pub async fn delete_affaire(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::CLIENT_WRITERS)?;
    ClientService::new(state.pool.clone()).delete_affaire(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Affaire deleted" })))
}

/// PUT /api/clients-affaires/clients/:id
pub async fn update_client(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<ClientInput>,
) -> ApiResult<Client> {
    user.authorize(access::CLIENT_WRITERS)?;

    let mut required = RequiredFields::new();
    let fields = ClientFields {
        nom: required.text("nom", body.nom),
        contact: required.text("contact", body.contact),
        adresse: required.text("adresse", body.adresse),
    };
    required.finish()?;

    let client = ClientService::new(state.pool.clone()).update_client(id, &fields).await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients-affaires/clients/:id - Also removes its affaires
pub async fn delete_client(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::CLIENT_WRITERS)?;
    ClientService::new(state.pool.clone()).delete_client(id).await?;
    Ok(ApiResponse::success(json!({ "message": "Client and its affaires deleted" })))
}
