pub mod db;
pub mod role;
pub mod user;
