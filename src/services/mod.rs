pub mod bon_service;
pub mod client_service;
pub mod intervention_service;
pub mod observation_service;
pub mod performance_service;
pub mod personnel_service;
pub mod sync_service;
pub mod user_service;

pub use bon_service::{BonService, NewBon};
pub use client_service::{AffaireFields, ClientFields, ClientService, NewClientAffaire};
pub use intervention_service::{InterventionFields, InterventionService};
pub use observation_service::ObservationService;
pub use performance_service::PerformanceService;
pub use personnel_service::{PersonnelFields, PersonnelService};
pub use sync_service::SyncService;
pub use user_service::{CredentialTable, NewMobileUser, NewUser, UserChanges, UserService};
