#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use tokio::task::JoinHandle;

use gestion_travaux::app;
use gestion_travaux::auth::password::hash_password;
use gestion_travaux::config::AppConfig;
use gestion_travaux::database::{DatabaseManager, DbPool};
use gestion_travaux::services::{NewMobileUser, NewUser, UserService};
use gestion_travaux::state::AppState;

pub const PASSWORD: &str = "Passw0rd!";

/// Seeded back-office accounts, one per role the tests exercise
pub const ADMIN: &str = "ADM001";
pub const RRH: &str = "RRH001";
pub const CHARGE_ETUDE: &str = "CE001";
pub const ASSISTANTE: &str = "AST001";
/// Seeded mobile account with fonction TECHNICIEN
pub const TECHNICIEN: &str = "TEC001";

/// The real router served on a free port, backed by its own SQLite file.
/// Each test gets a fresh server; it stops when the test's runtime ends.
pub struct TestServer {
    pub base_url: String,
    pub pool: DbPool,
    pub client: reqwest::Client,
    db_path: PathBuf,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let db_path = std::env::temp_dir().join(format!("gestion_it_{}_{}.db", std::process::id(), port));
        let mut config = AppConfig::development();
        config.database.url = format!("sqlite://{}?mode=rwc", db_path.display());
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.security.bcrypt_cost = 4;
        config.api.enable_request_logging = false;

        let pool = DatabaseManager::init(&config.database).await?;
        seed_accounts(&pool).await?;

        let router = app::router(AppState::new(pool.clone(), config));
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let server = Self {
            base_url,
            pool,
            client: reqwest::Client::new(),
            db_path,
            handle,
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs a seeded back-office account in and returns its token
    pub async fn login(&self, matricule: &str) -> Result<String> {
        self.token_from("/api/users/login", matricule).await
    }

    pub async fn login_mobile(&self, matricule: &str) -> Result<String> {
        self.token_from("/api/mobile/login-mobile", matricule).await
    }

    async fn token_from(&self, path: &str, matricule: &str) -> Result<String> {
        let res = self
            .client
            .post(self.url(path))
            .json(&serde_json::json!({ "matricule": matricule, "motDePasse": PASSWORD }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login of {} failed: {}", matricule, res.status());
        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.get(self.url(path)).bearer_auth(token).send().await?)
    }

    pub async fn post(&self, path: &str, token: &str, body: &Value) -> Result<Response> {
        Ok(self.client.post(self.url(path)).bearer_auth(token).json(body).send().await?)
    }

    pub async fn put(&self, path: &str, token: &str, body: &Value) -> Result<Response> {
        Ok(self.client.put(self.url(path)).bearer_auth(token).json(body).send().await?)
    }

    pub async fn delete(&self, path: &str, token: &str) -> Result<Response> {
        Ok(self.client.delete(self.url(path)).bearer_auth(token).send().await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.db_path.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

async fn seed_accounts(pool: &DbPool) -> Result<()> {
    let users = UserService::new(pool.clone());
    let hash = hash_password(PASSWORD, 4)?;

    for (matricule, role) in [
        (ADMIN, "Admin"),
        (RRH, "RRH"),
        (CHARGE_ETUDE, "CHARGE D'ETUDE"),
        (ASSISTANTE, "Assistante DES DIRECTIONS"),
    ] {
        let role_id = users.role_id_by_name(role).await?;
        users
            .create(&NewUser {
                matricule: matricule.to_string(),
                nom: "Test".to_string(),
                prenoms: role.to_string(),
                role_id,
                password_hash: hash.clone(),
            })
            .await?;
    }

    users
        .create_mobile(&NewMobileUser {
            matricule: TECHNICIEN.to_string(),
            nom: "Traore".to_string(),
            prenoms: "Issa".to_string(),
            fonction: "Technicien".to_string(),
            password_hash: hash,
        })
        .await?;
    Ok(())
}

/// A valid work order body with the given number
pub fn bon_body(numero_bon: i64) -> Value {
    serde_json::json!({
        "numero_bon": numero_bon,
        "affaire": "AF-2024-01",
        "client": "SODECI",
        "designation_travaux": "Remplacement compresseur",
        "date_recu": "2024-03-01",
        "facturation": "Non"
    })
}
