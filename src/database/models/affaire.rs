use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Affaire {
    pub id: i64,
    pub numero: String,
    pub designation: Option<String>,
    pub client_id: i64,
    pub statut: Option<String>,
}

pub const DEFAULT_AFFAIRE_STATUT: &str = "Actif";

/// Designation given to an affaire created without one
pub fn default_designation(numero: &str, client_nom: &str) -> String {
    format!("Affaire {} pour {}", numero, client_nom)
}
