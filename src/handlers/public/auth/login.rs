use axum::extract::State;
use tracing::{info, warn};

use super::{LoginRequest, LoginResponse, INVALID_CREDENTIALS};
use crate::auth::password::verify_password_blocking;
use crate::auth::{generate_jwt, Claims};
use crate::database::models::UserSummary;
use crate::error::ApiError;
use crate::handlers::validate::RequiredFields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use crate::types::AccountKind;

/// POST /api/users/login - Authenticate a back-office user
///
/// Expected Input:
/// ```json
/// { "matricule": "ADM001", "motDePasse": "..." }
/// ```
///
/// Expected Output:
/// ```json
/// {
///   "message": "Login successful",
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "user": { "id": 1, "matricule": "ADM001", "nom": "...", "prenoms": "...", "roleName": "Admin" }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse<UserSummary>> {
    let mut required = RequiredFields::new();
    let matricule = required.text("matricule", body.matricule);
    let password = required.value("motDePasse", body.mot_de_passe.filter(|p| !p.is_empty()));
    required.finish()?;

    let creds = UserService::new(state.pool.clone())
        .find_credentials(&matricule)
        .await?
        .ok_or_else(|| {
            warn!("Login refused: unknown matricule {}", matricule);
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    if !verify_password_blocking(password, creds.mot_de_passe.clone()).await? {
        warn!("Login refused: wrong password for {}", matricule);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let claims = Claims::new(
        creds.id,
        creds.matricule.clone(),
        creds.role_name.clone(),
        AccountKind::Web,
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    info!("User {} logged in as {}", creds.matricule, creds.role_name);
    Ok(ApiResponse::success(LoginResponse {
        message: "Login successful",
        token,
        user: creds.into(),
    }))
}
