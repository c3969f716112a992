// Token acquisition endpoints; no authentication required
pub mod auth;
