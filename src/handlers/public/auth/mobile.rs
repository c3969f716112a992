use axum::extract::State;
use serde::Serialize;
use tracing::{info, warn};

use super::{LoginRequest, LoginResponse, INVALID_CREDENTIALS};
use crate::auth::password::verify_password_blocking;
use crate::auth::{generate_jwt, Claims};
use crate::error::ApiError;
use crate::handlers::validate::RequiredFields;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::services::UserService;
use crate::state::AppState;
use crate::types::{AccountKind, Role};

#[derive(Debug, Serialize)]
pub struct MobileUserInfo {
    pub id: i64,
    pub matricule: String,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    pub fonction: Option<String>,
}

/// POST /api/mobile/login-mobile - Authenticate field staff from the mobile app
///
/// The token's role is the account's `fonction`, normalized to a known role
/// name when it matches one (so "Technicien" becomes `TECHNICIEN`).
pub async fn login_mobile(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse<MobileUserInfo>> {
    let mut required = RequiredFields::new();
    let matricule = required.text("matricule", body.matricule);
    let password = required.value("motDePasse", body.mot_de_passe.filter(|p| !p.is_empty()));
    required.finish()?;

    let user = UserService::new(state.pool.clone())
        .find_mobile(&matricule)
        .await?
        .ok_or_else(|| {
            warn!("Mobile login refused: unknown matricule {}", matricule);
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    if !verify_password_blocking(password, user.mot_de_passe.clone()).await? {
        warn!("Mobile login refused: wrong password for {}", matricule);
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let fonction = user.fonction.clone().unwrap_or_default();
    let role = fonction
        .parse::<Role>()
        .map(|r| r.as_str().to_string())
        .unwrap_or_else(|_| fonction.trim().to_string());

    let claims = Claims::new(
        user.id,
        user.matricule.clone(),
        role,
        AccountKind::Mobile,
        state.config.security.jwt_expiry_hours,
    );
    let token = generate_jwt(&claims, &state.config.security.jwt_secret)?;

    info!("Mobile user {} logged in", user.matricule);
    Ok(ApiResponse::success(LoginResponse {
        message: "Login successful",
        token,
        user: MobileUserInfo {
            id: user.id,
            matricule: user.matricule,
            nom: user.nom,
            prenoms: user.prenoms,
            fonction: user.fonction,
        },
    }))
}
