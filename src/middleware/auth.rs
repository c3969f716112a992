use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::{AccountKind, Role};

/// Authenticated caller, decoded from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub matricule: String,
    /// Role name as carried by the token
    pub role: String,
    pub kind: AccountKind,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            matricule: claims.matricule,
            role: claims.role,
            kind: claims.kind,
        }
    }
}

impl AuthUser {
    /// Checks the caller's role against a route allow-list.
    /// A role name that does not parse is refused like any other.
    pub fn authorize(&self, allowed: &[Role]) -> Result<Role, ApiError> {
        match self.role.parse::<Role>() {
            Ok(role) if allowed.contains(&role) => Ok(role),
            _ => {
                warn!(
                    matricule = %self.matricule,
                    role = %self.role,
                    "Access refused: role not allowed on this route"
                );
                Err(ApiError::forbidden("Access denied: insufficient permissions"))
            }
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Validates the bearer token and injects `AuthUser` into the request.
/// Missing token answers 401; a token that fails validation answers 403.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(request.headers()).map_err(ApiError::unauthorized)?;

    let claims = validate_jwt(&token, &state.config.security.jwt_secret)?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or("Access denied: no token provided")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Access denied: no token provided"),
        None => Err("Authorization header must use Bearer token format"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: &str) -> AuthUser {
        AuthUser {
            id: 1,
            matricule: "M001".into(),
            role: role.into(),
            kind: AccountKind::Web,
        }
    }

    #[test]
    fn authorize_accepts_listed_role() {
        let role = user("RRH").authorize(&[Role::Admin, Role::Rrh]).unwrap();
        assert_eq!(role, Role::Rrh);
    }

    #[test]
    fn authorize_refuses_unlisted_and_unknown_roles() {
        assert!(user("TECHNICIEN").authorize(&[Role::Admin]).is_err());
        assert!(user("Stagiaire").authorize(&Role::ALL).is_err());
    }

    #[test]
    fn header_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_jwt_from_headers(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_jwt_from_headers(&headers).unwrap(), "abc.def.ghi");
    }
}
