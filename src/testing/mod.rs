use std::path::PathBuf;

use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::database::{DatabaseManager, DbPool};

/// A freshly migrated database in its own temporary file
pub struct TestContext {
    pub pool: DbPool,
    path: PathBuf,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let path = std::env::temp_dir().join(format!("gestion_test_{}.db", Uuid::new_v4().simple()));
        let config = DatabaseConfig {
            url: format!("sqlite://{}?mode=rwc", path.display()),
            max_connections: 2,
            connection_timeout: 5,
        };

        let pool = DatabaseManager::init(&config)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize test database: {}", e))?;

        Ok(Self { pool, path })
    }

    /// Inserts a minimal bon and returns its id
    pub async fn insert_bon(&self, numero_bon: i64, client: &str) -> anyhow::Result<i64> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO bonsdetravail (numero_bon, affaire, client, designation_travaux, date_recu, facturation)
            VALUES (?, 'AF-TEST', ?, 'Maintenance', '2024-01-15', 'Non')
            RETURNING id
            "#,
        )
        .bind(numero_bon)
        .bind(client)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
