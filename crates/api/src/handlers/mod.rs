pub mod blocklists;
pub mod cache;
pub mod clients;
pub mod cluster;
pub mod health;
pub mod hostname;
pub mod query_logs;
pub mod rewrites;
pub mod rules;
pub mod settings;

pub use health::health_check;
pub use hostname::get_hostname;
