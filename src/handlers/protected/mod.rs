pub mod bons;
pub mod clients_affaires;
pub mod interventions;
pub mod observations;
pub mod performance;
pub mod personnels;
pub mod sync;
pub mod users;
