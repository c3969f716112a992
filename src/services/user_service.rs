use tracing::info;

use crate::database::manager::is_foreign_key_violation;
use crate::database::models::{MobileUser, RoleRow, UserCredentials, UserSummary};
use crate::database::{DatabaseError, DbPool, UpdateBuilder};

/// Fields of a new back-office account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    pub role_id: i64,
    pub password_hash: String,
}

/// Partial update of an account; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub matricule: Option<String>,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    pub role_id: Option<i64>,
    pub password_hash: Option<String>,
}

impl UserChanges {
    /// True when no column would change; blank text counts as absent
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true);
        blank(&self.matricule)
            && blank(&self.nom)
            && blank(&self.prenoms)
            && self.role_id.is_none()
            && self.password_hash.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewMobileUser {
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    pub fonction: String,
    pub password_hash: String,
}

/// Which table a stored password lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialTable {
    Users,
    MobileUsers,
}

impl CredentialTable {
    fn table_name(&self) -> &'static str {
        match self {
            CredentialTable::Users => "users",
            CredentialTable::MobileUsers => "mobile_users",
        }
    }
}

/// Back-office accounts, roles and field-staff (mobile) accounts
pub struct UserService {
    pool: DbPool,
}

impl UserService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, DatabaseError> {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.matricule, u.nom, u.prenoms, r.name AS role_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn roles(&self) -> Result<Vec<RoleRow>, DatabaseError> {
        let roles = sqlx::query_as::<_, RoleRow>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    pub async fn role_id_by_name(&self, name: &str) -> Result<i64, DatabaseError> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Role '{}' not found", name)))
    }

    /// Login lookup: the account with its role name and stored hash
    pub async fn find_credentials(&self, matricule: &str) -> Result<Option<UserCredentials>, DatabaseError> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT u.id, u.matricule, u.nom, u.prenoms, u.mot_de_passe, r.name AS role_name
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.matricule = ?
            "#,
        )
        .bind(matricule)
        .fetch_optional(&self.pool)
        .await?;
        Ok(creds)
    }

    pub async fn create(&self, user: &NewUser) -> Result<i64, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (matricule, nom, prenoms, role_id, mot_de_passe)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.matricule)
        .bind(&user.nom)
        .bind(&user.prenoms)
        .bind(user.role_id)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| write_error(e, user.role_id))?;

        info!("Created user {} (id {})", user.matricule, id);
        Ok(id)
    }

    pub async fn update(&self, id: i64, changes: UserChanges) -> Result<(), DatabaseError> {
        let role_id = changes.role_id;
        let builder = UpdateBuilder::new("users")
            .set_text("matricule", changes.matricule)
            .set_text("nom", changes.nom)
            .set_text("prenoms", changes.prenoms)
            .set("role_id", changes.role_id)
            .set("mot_de_passe", changes.password_hash);

        if builder.is_empty() {
            return Err(DatabaseError::QueryError("No field to update".to_string()));
        }

        let result = builder
            .execute(id, &self.pool)
            .await
            .map_err(|e| write_error(e, role_id.unwrap_or_default()))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        info!("Updated user {}", id);
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn find_mobile(&self, matricule: &str) -> Result<Option<MobileUser>, DatabaseError> {
        let user = sqlx::query_as::<_, MobileUser>(
            "SELECT id, matricule, nom, prenoms, fonction, mot_de_passe FROM mobile_users WHERE matricule = ?",
        )
        .bind(matricule)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn create_mobile(&self, user: &NewMobileUser) -> Result<i64, DatabaseError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO mobile_users (matricule, nom, prenoms, fonction, mot_de_passe)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&user.matricule)
        .bind(&user.nom)
        .bind(&user.prenoms)
        .bind(&user.fonction)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::conflict_or(e, "A mobile user with this matricule already exists"))?;

        info!("Created mobile user {} (id {})", user.matricule, id);
        Ok(id)
    }

    /// Every stored password of a table, hashed or not
    pub async fn stored_passwords(&self, table: CredentialTable) -> Result<Vec<(i64, String)>, DatabaseError> {
        let sql = format!("SELECT id, mot_de_passe FROM {} ORDER BY id", table.table_name());
        let rows = sqlx::query_as::<_, (i64, String)>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn set_password_hash(
        &self,
        table: CredentialTable,
        id: i64,
        password_hash: &str,
    ) -> Result<(), DatabaseError> {
        let sql = format!("UPDATE {} SET mot_de_passe = ? WHERE id = ?", table.table_name());
        sqlx::query(&sql)
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn write_error(err: sqlx::Error, role_id: i64) -> DatabaseError {
    if is_foreign_key_violation(&err) {
        DatabaseError::NotFound(format!("Role {} not found", role_id))
    } else {
        DatabaseError::conflict_or(err, "A user with this matricule already exists")
    }
}
