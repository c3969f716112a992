use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Back-office account as stored
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    pub role_id: i64,
    pub mot_de_passe: String,
}

/// Account listing row, joined with the role name and without the hash
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    #[serde(rename = "roleName")]
    pub role_name: String,
}

/// Row used by the login flow
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    pub mot_de_passe: String,
    pub role_name: String,
}

impl From<UserCredentials> for UserSummary {
    fn from(creds: UserCredentials) -> Self {
        Self {
            id: creds.id,
            matricule: creds.matricule,
            nom: creds.nom,
            prenoms: creds.prenoms,
            role_name: creds.role_name,
        }
    }
}

/// Create/update body of `/api/users`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    #[serde(default, deserialize_with = "super::lenient::opt_text")]
    pub matricule: Option<String>,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    #[serde(rename = "roleId", default, deserialize_with = "super::lenient::opt_i64")]
    pub role_id: Option<i64>,
    #[serde(rename = "motDePasse")]
    pub mot_de_passe: Option<String>,
}

/// Answer to a successful account creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedUser {
    pub id: i64,
    pub matricule: String,
    pub nom: String,
    pub prenoms: String,
    #[serde(rename = "roleId")]
    pub role_id: i64,
}
