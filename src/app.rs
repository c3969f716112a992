use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::state::AppState;

/// The full HTTP application: public routes, JWT-protected API groups and
/// the global layers.
pub fn router(state: AppState) -> Router {
    let api = &state.config.api;

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes(&state))
        // Global middleware
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins));

    let router = if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/api/users/login", post(auth::login))
        .route("/api/mobile/login-mobile", post(auth::login_mobile))
}

/// Every group below requires a bearer token
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(user_routes())
        .merge(personnel_routes())
        .merge(bon_routes())
        .merge(intervention_routes())
        .merge(observation_routes())
        .merge(client_affaire_routes())
        .merge(sync_routes())
        .merge(performance_routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn user_routes() -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/roles", get(users::roles))
        .route("/api/users/:id", put(users::update).delete(users::delete))
}

fn personnel_routes() -> Router<AppState> {
    use protected::personnels;

    Router::new()
        .route("/api/personnels", get(personnels::list).post(personnels::create))
        .route("/api/personnels/techniciens", get(personnels::techniciens))
        .route("/api/personnels/sync", post(personnels::sync))
        .route("/api/personnels/:id", put(personnels::update).delete(personnels::delete))
}

fn bon_routes() -> Router<AppState> {
    use protected::bons;

    Router::new()
        .route("/api/bons", get(bons::list).post(bons::create))
        .route("/api/bons/export", get(bons::export))
        .route("/api/bons/interventions/:bon_id", get(bons::interventions))
        .route("/api/bons/:id", get(bons::get).put(bons::update).delete(bons::delete))
}

fn intervention_routes() -> Router<AppState> {
    use protected::interventions;

    Router::new()
        .route("/api/interventions", get(interventions::list).post(interventions::create))
        .route("/api/interventions/sync", post(interventions::sync))
        .route(
            "/api/interventions/:id",
            put(interventions::update).delete(interventions::delete),
        )
}

fn observation_routes() -> Router<AppState> {
    use protected::observations;

    Router::new()
        .route("/api/observations", get(observations::list).post(observations::create))
        .route(
            "/api/observations/:id",
            put(observations::update).delete(observations::delete),
        )
}

fn client_affaire_routes() -> Router<AppState> {
    use protected::clients_affaires;

    Router::new()
        .route(
            "/api/clients-affaires",
            get(clients_affaires::list).post(clients_affaires::create),
        )
        .route(
            "/api/clients-affaires/affaires/:id",
            put(clients_affaires::update_affaire).delete(clients_affaires::delete_affaire),
        )
        .route(
            "/api/clients-affaires/clients/:id",
            put(clients_affaires::update_client).delete(clients_affaires::delete_client),
        )
}

fn sync_routes() -> Router<AppState> {
    Router::new().route("/api/sync/bon-de-travail", post(protected::sync::bons))
}

fn performance_routes() -> Router<AppState> {
    use protected::performance;

    Router::new()
        .route("/api/performance/techniciens", get(performance::techniciens))
        .route("/api/performance/analyse-pannes", get(performance::analyse_pannes))
}

/// Any origin when none are configured, otherwise only the listed ones
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Gestion Travaux API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Work orders, interventions and HSE observations for technical-services teams",
        "endpoints": {
            "auth": "/api/users/login, /api/mobile/login-mobile (public)",
            "users": "/api/users[/:id], /api/users/roles",
            "personnels": "/api/personnels[/:id], /api/personnels/techniciens, /api/personnels/sync",
            "bons": "/api/bons[/:id], /api/bons/interventions/:bon_id, /api/bons/export",
            "interventions": "/api/interventions[/:id], /api/interventions/sync",
            "observations": "/api/observations[/:id]",
            "clients_affaires": "/api/clients-affaires, /api/clients-affaires/affaires/:id, /api/clients-affaires/clients/:id",
            "sync": "/api/sync/bon-de-travail",
            "performance": "/api/performance/techniciens, /api/performance/analyse-pannes",
            "health": "/health (public)"
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "degraded",
                    "timestamp": now,
                    "database": "unavailable"
                })),
            )
        }
    }
}
