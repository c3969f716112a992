use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gestion_travaux::app;
use gestion_travaux::config::config;
use gestion_travaux::database::DatabaseManager;
use gestion_travaux::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, JWT_SECRET and PORT are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config().clone();
    info!("Starting Gestion Travaux API in {:?} mode", config.environment);

    let pool = DatabaseManager::init(&config.database)
        .await
        .context("failed to open the database")?;

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let app = app::router(AppState::new(pool, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Gestion Travaux API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
