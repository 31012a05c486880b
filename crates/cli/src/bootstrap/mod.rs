pub mod admin_key;
pub mod config;
pub mod database;
pub mod logging;

pub use admin_key::load_or_create_admin_key;
pub use config::load_config;
pub use database::init_database;
pub use logging::init_logging;
