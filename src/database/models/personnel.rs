use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Personnel {
    pub id: i64,
    pub matricule: String,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    pub fonction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Technicien {
    pub matricule: String,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
}

/// Body of create, update and sync requests. `id` is only read by sync.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonnelInput {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub matricule: Option<String>,
    pub nom: Option<String>,
    pub prenoms: Option<String>,
    pub fonction: Option<String>,
}
