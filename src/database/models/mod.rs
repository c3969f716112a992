pub mod affaire;
pub mod bon;
pub mod client;
pub mod intervention;
pub mod mobile_user;
pub mod observation;
pub mod personnel;
pub mod role;
pub mod user;

pub use affaire::Affaire;
pub use bon::{export_rows, Bon, BonDetail, BonExportRow, BonInput, BonSummary, FieldBon, InterventionBrief};
pub use client::{AffaireBrief, AffaireUpdateInput, Client, ClientAffaireInput, ClientInput, ClientWithAffaires};
pub use intervention::{Intervention, InterventionInput, InterventionListing};
pub use mobile_user::MobileUser;
pub use observation::{Observation, ObservationInput};
pub use personnel::{Personnel, PersonnelInput, Technicien};
pub use role::RoleRow;
pub use user::{CreatedUser, User, UserCredentials, UserInput, UserSummary};

/// Form clients send numbers and flags as JSON numbers, strings or
/// booleans depending on the input widget; these accept all of them.
pub mod lenient {
    use serde::{de, Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", n))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("expected an integer, got \"{}\"", s))),
            Some(other) => Err(de::Error::custom(format!("expected an integer, got {}", other))),
        }
    }

    pub fn opt_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(Value::Number(n)) => Ok(Some(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
            Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
                "" => Ok(None),
                "1" | "true" | "oui" | "validé" => Ok(Some(true)),
                "0" | "false" | "non" | "non validé" => Ok(Some(false)),
                _ => Err(de::Error::custom(format!("expected a boolean, got \"{}\"", s))),
            },
            Some(other) => Err(de::Error::custom(format!("expected a boolean, got {}", other))),
        }
    }

    /// Text fields that older clients sometimes send as numbers
    pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(Value::Bool(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(de::Error::custom(format!("expected text, got {}", other))),
        }
    }
}

/// True when the value is present and not blank
pub fn is_present(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}
