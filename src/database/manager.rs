use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

pub type DbPool = SqlitePool;

/// Errors from DatabaseManager and the services built on it
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Turns a unique-constraint violation into `Conflict(message)`; any
    /// other error passes through unchanged.
    pub fn conflict_or(err: sqlx::Error, message: impl Into<String>) -> Self {
        if is_unique_violation(&err) {
            DatabaseError::Conflict(message.into())
        } else {
            DatabaseError::Sqlx(err)
        }
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_foreign_key_violation(),
        _ => false,
    }
}

/// Opens the SQLite pool and keeps the schema current
pub struct DatabaseManager;

impl DatabaseManager {
    /// Connect using the configured URL, creating the file when missing
    pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl(config.url.clone()))?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(config.connection_timeout));

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        info!("Opened SQLite pool for {}", config.url);
        Ok(pool)
    }

    /// Apply embedded migrations (schema + default roles)
    pub async fn migrate(pool: &DbPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database schema is up to date");
        Ok(())
    }

    /// Connect and migrate in one step, as done at server startup
    pub async fn init(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
        let pool = Self::connect(config).await?;
        Self::migrate(&pool).await?;
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &DbPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
