use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::lenient;

/// HSE/HSSE observation, optionally attached to a bon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Observation {
    pub id: i64,
    pub bon_id: Option<i64>,
    pub tool_box_details: Option<String>,
    pub tool_box_responsable: Option<String>,
    pub rapport_incident: Option<String>,
    pub suivi_dechets_details: Option<String>,
    pub suivi_dechets_responsable: Option<String>,
    pub hsse: Option<String>,
    pub environnement: Option<String>,
    pub date: Option<String>,
    pub observateur: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub gravite: Option<String>,
    pub statut: Option<String>,
    pub chantier: Option<String>,
}

/// Create, update and sync body. `id` is only read by sync; `bon_id` links
/// the observation to a work order everywhere.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservationInput {
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub bon_id: Option<i64>,
    pub tool_box_details: Option<String>,
    pub tool_box_responsable: Option<String>,
    pub rapport_incident: Option<String>,
    pub suivi_dechets_details: Option<String>,
    pub suivi_dechets_responsable: Option<String>,
    pub hsse: Option<String>,
    pub environnement: Option<String>,
    pub date: Option<String>,
    pub observateur: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub gravite: Option<String>,
    pub statut: Option<String>,
    pub chantier: Option<String>,
}
