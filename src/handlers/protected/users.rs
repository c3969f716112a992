use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::access;
use crate::auth::password::hash_password_blocking;
use crate::database::models::{CreatedUser, RoleRow, UserInput, UserSummary};
use crate::error::ApiError;
use crate::handlers::validate::{optional_text, RequiredFields};
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser};
use crate::services::{NewUser, UserChanges, UserService};
use crate::state::AppState;

/// GET /api/users - Accounts with their role name, never the password hash
pub async fn list(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<UserSummary>> {
    user.authorize(access::USER_READERS)?;
    let users = UserService::new(state.pool.clone()).list().await?;
    Ok(ApiResponse::success(users))
}

/// GET /api/users/roles
pub async fn roles(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<RoleRow>> {
    user.authorize(access::USER_READERS)?;
    let roles = UserService::new(state.pool.clone()).roles().await?;
    Ok(ApiResponse::success(roles))
}

/// POST /api/users - Create a back-office account
///
/// Expected Input:
/// ```json
/// { "matricule": "RH002", "nom": "...", "prenoms": "...", "roleId": 5, "motDePasse": "..." }
/// ```
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<UserInput>,
) -> ApiResult<CreatedUser> {
    user.authorize(access::USER_WRITERS)?;

    let mut required = RequiredFields::new();
    let matricule = required.text("matricule", body.matricule);
    let nom = required.text("nom", body.nom);
    let prenoms = required.text("prenoms", body.prenoms);
    let role_id = required.value("roleId", body.role_id);
    let password = required.value("motDePasse", body.mot_de_passe.filter(|p| !p.is_empty()));
    required.finish()?;

    let password_hash = hash_password_blocking(password, state.config.security.bcrypt_cost).await?;
    let new_user = NewUser {
        matricule,
        nom,
        prenoms,
        role_id,
        password_hash,
    };
    let id = UserService::new(state.pool.clone()).create(&new_user).await?;

    Ok(ApiResponse::created(CreatedUser {
        id,
        matricule: new_user.matricule,
        nom: new_user.nom,
        prenoms: new_user.prenoms,
        role_id: new_user.role_id,
    }))
}

/// PUT /api/users/:id - Update the fields that were sent; a new password is re-hashed
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(body): ApiJson<UserInput>,
) -> ApiResult<Value> {
    user.authorize(access::USER_WRITERS)?;

    let mut changes = UserChanges {
        matricule: optional_text(body.matricule),
        nom: optional_text(body.nom),
        prenoms: optional_text(body.prenoms),
        role_id: body.role_id,
        password_hash: None,
    };
    let password = body.mot_de_passe.filter(|p| !p.is_empty());
    if changes.is_empty() && password.is_none() {
        return Err(ApiError::bad_request("No field to update"));
    }
    if let Some(password) = password {
        changes.password_hash = Some(hash_password_blocking(password, state.config.security.bcrypt_cost).await?);
    }

    UserService::new(state.pool.clone()).update(id, changes).await?;
    Ok(ApiResponse::success(json!({ "message": "User updated", "id": id })))
}

/// DELETE /api/users/:id
pub async fn delete(State(state): State<AppState>, user: AuthUser, ApiPath(id): ApiPath<i64>) -> ApiResult<Value> {
    user.authorize(access::USER_WRITERS)?;
    UserService::new(state.pool.clone()).delete(id).await?;
    Ok(ApiResponse::success(json!({ "message": "User deleted" })))
}
