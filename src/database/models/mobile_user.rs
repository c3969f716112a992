use serde::Serialize;
use sqlx::FromRow;

/// Field staff account used by the mobile application
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MobileUser {
    pub id: i64,
    pub matricule: String,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    pub fonction: Option<String>,
    #[serde(skip_serializing)]
    pub mot_de_passe: String,
}
