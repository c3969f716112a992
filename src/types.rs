/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles known to the access rules. The names are the values stored in
/// `roles.name` and carried in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "Admin")]
    Admin,
    #[serde(rename = "RESPONSABLE TECHNIQUE")]
    ResponsableTechnique,
    #[serde(rename = "CHARGE D'ETUDE")]
    ChargeEtude,
    #[serde(rename = "Assistante DES DIRECTIONS")]
    AssistanteDirections,
    #[serde(rename = "RRH")]
    Rrh,
    #[serde(rename = "TECHNICIEN")]
    Technicien,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Admin,
        Role::ResponsableTechnique,
        Role::ChargeEtude,
        Role::AssistanteDirections,
        Role::Rrh,
        Role::Technicien,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::ResponsableTechnique => "RESPONSABLE TECHNIQUE",
            Role::ChargeEtude => "CHARGE D'ETUDE",
            Role::AssistanteDirections => "Assistante DES DIRECTIONS",
            Role::Rrh => "RRH",
            Role::Technicien => "TECHNICIEN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case and whitespace tolerant: older rows contain non-breaking spaces
    /// and mixed-case function names ("Technicien").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .split(|c: char| c.is_whitespace() || c == '\u{a0}')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        Role::ALL
            .into_iter()
            .find(|role| role.as_str().to_uppercase() == normalized)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

/// Kind of account a token was issued to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Back-office user from the `users` table
    Web,
    /// Field staff from the `mobile_users` table
    Mobile,
}

/// Processing state of an HSE observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObservationStatus {
    #[serde(rename = "Traitée")]
    Traitee,
    #[serde(rename = "Non traitée")]
    NonTraitee,
}

impl ObservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationStatus::Traitee => "Traitée",
            ObservationStatus::NonTraitee => "Non traitée",
        }
    }

    /// Checks an optional `statut` and returns the stored label; blank or
    /// absent stays `None`.
    pub fn normalize(statut: Option<&str>) -> Result<Option<&'static str>, UnknownObservationStatus> {
        match statut.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s.parse::<ObservationStatus>().map(|status| Some(status.as_str())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid statut '{0}': expected 'Traitée' or 'Non traitée'")]
pub struct UnknownObservationStatus(pub String);

impl FromStr for ObservationStatus {
    type Err = UnknownObservationStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Traitée" => Ok(ObservationStatus::Traitee),
            "Non traitée" => Ok(ObservationStatus::NonTraitee),
            other => Err(UnknownObservationStatus(other.to_string())),
        }
    }
}

/// Label shown for a work order's validation flag.
pub fn validation_label(est_valide: bool) -> &'static str {
    if est_valide {
        "Validé"
    } else {
        "Non validé"
    }
}
