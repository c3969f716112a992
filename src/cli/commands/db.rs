use serde_json::json;
use tracing::info;

use crate::auth::password::{hash_password_blocking, is_hashed};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::{DatabaseManager, DbPool};
use crate::services::{CredentialTable, UserService};

pub async fn migrate(pool: &DbPool, output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate(pool).await?;
    output_success(output_format, "Database schema is up to date", None)
}

pub async fn migrate_passwords(pool: &DbPool, cost: u32, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = hash_plaintext_passwords(pool, CredentialTable::Users, cost).await?;
    let mobile_users = hash_plaintext_passwords(pool, CredentialTable::MobileUsers, cost).await?;

    output_success(
        output_format,
        &format!("Hashed {} user and {} mobile user passwords", users, mobile_users),
        Some(json!({ "users": users, "mobile_users": mobile_users })),
    )
}

/// Replaces every stored value that is not yet a bcrypt hash; returns how
/// many rows changed. Running it twice changes nothing the second time.
pub async fn hash_plaintext_passwords(pool: &DbPool, table: CredentialTable, cost: u32) -> anyhow::Result<usize> {
    let service = UserService::new(pool.clone());
    let mut changed = 0;

    for (id, stored) in service.stored_passwords(table).await? {
        if is_hashed(&stored) {
            continue;
        }
        let hash = hash_password_blocking(stored, cost).await?;
        service.set_password_hash(table, id, &hash).await?;
        changed += 1;
    }

    info!("Hashed {} plaintext passwords in {:?}", changed, table);
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::verify_password;
    use crate::testing::TestContext;

    #[tokio::test]
    async fn plaintext_passwords_are_hashed_once() {
        let ctx = TestContext::new().await.unwrap();
        sqlx::query(
            "INSERT INTO users (matricule, nom, prenoms, role_id, mot_de_passe) VALUES ('A1', 'Kone', 'Awa', 1, 'secret')",
        )
        .execute(&ctx.pool)
        .await
        .unwrap();

        let changed = hash_plaintext_passwords(&ctx.pool, CredentialTable::Users, 4).await.unwrap();
        assert_eq!(changed, 1);

        let stored: String = sqlx::query_scalar("SELECT mot_de_passe FROM users WHERE matricule = 'A1'")
            .fetch_one(&ctx.pool)
            .await
            .unwrap();
        assert!(verify_password("secret", &stored).unwrap());

        let again = hash_plaintext_passwords(&ctx.pool, CredentialTable::Users, 4).await.unwrap();
        assert_eq!(again, 0);
    }
}
