pub mod manager;
pub mod models;
pub mod query_builder;

pub use manager::{DatabaseError, DatabaseManager, DbPool};
pub use query_builder::UpdateBuilder;
