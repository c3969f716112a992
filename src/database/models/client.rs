use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Affaire;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Client {
    pub id: i64,
    pub nom: String,
    pub contact: Option<String>,
    pub adresse: Option<String>,
}

/// A client with the affaires it owns, as listed by the dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ClientWithAffaires {
    pub id: i64,
    pub nom: String,
    pub contact: Option<String>,
    pub adresse: Option<String>,
    pub affaires: Vec<AffaireBrief>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AffaireBrief {
    pub id: i64,
    pub numero: String,
    pub designation: Option<String>,
    pub statut: Option<String>,
}

impl From<Affaire> for AffaireBrief {
    fn from(affaire: Affaire) -> Self {
        Self {
            id: affaire.id,
            numero: affaire.numero,
            designation: affaire.designation,
            statut: affaire.statut,
        }
    }
}

/// Body of `POST /api/clients-affaires`: a client (found by name or created)
/// and the affaire to open for it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientAffaireInput {
    pub nom: Option<String>,
    pub contact: Option<String>,
    pub adresse: Option<String>,
    #[serde(default, deserialize_with = "super::lenient::opt_text")]
    pub numero: Option<String>,
    pub designation: Option<String>,
    pub statut: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffaireUpdateInput {
    #[serde(default, deserialize_with = "super::lenient::opt_text")]
    pub numero: Option<String>,
    pub designation: Option<String>,
    pub statut: Option<String>,
    #[serde(default, deserialize_with = "super::lenient::opt_i64")]
    pub client_id: Option<i64>,
    pub client_nom: Option<String>,
    pub client_adresse: Option<String>,
    pub client_contact: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    pub nom: Option<String>,
    pub contact: Option<String>,
    pub adresse: Option<String>,
}
