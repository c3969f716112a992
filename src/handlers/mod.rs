pub mod protected;
pub mod public;
pub mod sync_status;
pub mod validate;
