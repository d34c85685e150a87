pub mod backup;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod database;
pub mod expiry;
pub mod models;
pub mod notify;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use expiry::ExpiryStatus;
pub use models::{Product, Settings};
pub use utils::Profile;
