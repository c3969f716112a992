use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// A logged work session on a bon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Intervention {
    pub id: i64,
    pub bon_id: i64,
    pub du: Option<String>,
    pub au: Option<String>,
    pub matricule: Option<String>,
    pub prenoms: Option<String>,
    pub binome: Option<String>,
    pub heure_debut: Option<String>,
    pub heure_fin: Option<String>,
    pub total_heures: Option<String>,
    pub description_detail: Option<String>,
    pub observation_detail: Option<String>,
    pub is_synced: bool,
}

/// Intervention joined with the fields of its bon, for the interventions page
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InterventionListing {
    pub id: i64,
    pub bon_id: i64,
    pub numero_bon: i64,
    pub du: Option<String>,
    pub au: Option<String>,
    pub matricule: Option<String>,
    pub prenoms: Option<String>,
    pub binome: Option<String>,
    pub heure_debut: Option<String>,
    pub heure_fin: Option<String>,
    pub designation: Option<String>,
    pub description: Option<String>,
    pub observations: Option<String>,
    pub client: Option<String>,
    pub affaire: Option<String>,
    pub adresse: Option<String>,
}

/// Create, update and sync body. `id` is only read by sync.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterventionInput {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub bon_id: Option<i64>,
    pub du: Option<String>,
    pub au: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub matricule: Option<String>,
    pub prenoms: Option<String>,
    pub binome: Option<String>,
    pub heure_debut: Option<String>,
    pub heure_fin: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub total_heures: Option<String>,
    pub description_detail: Option<String>,
    pub observation_detail: Option<String>,
}
