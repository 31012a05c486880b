//! Environment-driven configuration, one file per concern.
//!
//! - `server`: DNS + admin HTTP bind addresses.
//! - `dns`: upstream transport defaults.
//! - `database`: SQLite path and pool tuning.
//! - `logging`: log level.
//! - `cluster`: HA pairing defaults.
//! - `retention`: query-log retention/maintenance cadence.
//! - `secrets`: secret-store key source and scrypt params.
//! - `root`: `Config` aggregate + `CliOverrides`.

pub mod cluster;
pub mod database;
pub mod dns;
pub mod errors;
pub mod logging;
pub mod retention;
pub mod root;
pub mod secrets;
pub mod server;

pub use cluster::ClusterSettingsConfig;
pub use database::DatabaseConfig;
pub use dns::DnsConfig;
pub use errors::ConfigError;
pub use logging::LoggingConfig;
pub use retention::RetentionConfig;
pub use root::{CliOverrides, Config};
pub use secrets::SecretsConfig;
pub use server::ServerConfig;
