pub mod login;
pub mod mobile;

use serde::{Deserialize, Serialize};

use crate::database::models::lenient;

/// Shared body of both login endpoints
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub matricule: Option<String>,
    #[serde(rename = "motDePasse")]
    pub mot_de_passe: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse<U: Serialize> {
    pub message: &'static str,
    pub token: String,
    pub user: U,
}

/// Same answer for unknown matricule and wrong password
pub(crate) const INVALID_CREDENTIALS: &str = "Invalid matricule or password";

pub use login::login;
pub use mobile::login_mobile;
