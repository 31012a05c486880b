use super::cluster::ClusterSettingsConfig;
use super::database::DatabaseConfig;
use super::dns::DnsConfig;
use super::errors::ConfigError;
use super::logging::LoggingConfig;
use super::retention::RetentionConfig;
use super::secrets::SecretsConfig;
use super::server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The full configuration tree, following the teacher's one-struct-per-
/// concern layout (spec §3).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cluster: ClusterSettingsConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

/// CLI-supplied overrides (clap), mirroring the teacher's `CliOverrides`
/// split: these win over both the file and the environment.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub dns_bind_address: Option<String>,
    pub admin_bind_address: Option<String>,
    pub database_path: Option<String>,
    pub config_file: Option<String>,
}

impl Config {
    /// Load config from an optional TOML file, then apply environment
    /// variable overrides, then `CliOverrides` (highest precedence).
    ///
    /// Every field has a default suitable for a single-container
    /// deployment; nothing here is required to boot.
    pub fn load(config_path: Option<&str>, overrides: CliOverrides) -> Result<Config, ConfigError> {
        let mut config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_string(),
                    source,
                })?;
                toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_string(),
                    source,
                })?
            }
            _ => Config::default(),
        };

        config.apply_env();

        if let Some(v) = overrides.dns_bind_address {
            config.server.dns_bind_address = v;
        }
        if let Some(v) = overrides.admin_bind_address {
            config.server.admin_bind_address = v;
        }
        if let Some(v) = overrides.database_path {
            config.database.path = v;
        }

        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SENTINEL_DNS_BIND") {
            self.server.dns_bind_address = v;
        }
        if let Ok(v) = std::env::var("SENTINEL_ADMIN_BIND") {
            self.server.admin_bind_address = v;
        }
        if let Ok(v) = std::env::var("SENTINEL_DB_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = std::env::var("SENTINEL_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = std::env::var("QUERY_LOGS_RETENTION_DAYS") {
            if let Ok(days) = v.parse() {
                self.retention.query_log_retention_days = days;
            }
        }
        if let Ok(v) = std::env::var("SENTINEL_SECRETS_KEY") {
            self.secrets.secrets_key = Some(v);
        }
        if let Ok(v) = std::env::var("SENTINEL_HA_ROLE_OVERRIDE_PATH") {
            self.cluster.role_override_path = v;
        }
    }

    /// Cross-field sanity checks beyond what `serde` already enforces per
    /// field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.dns_bind_address is not a valid socket address: {}",
                self.server.dns_bind_address
            )));
        }
        if self.server.admin_bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "server.admin_bind_address is not a valid socket address: {}",
                self.server.admin_bind_address
            )));
        }
        if self.dns.upstream_servers.is_empty() {
            return Err(ConfigError::Invalid(
                "dns.upstream_servers must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().expect("default config must validate");
    }

    #[test]
    fn cli_overrides_win() {
        let overrides = CliOverrides {
            dns_bind_address: Some("127.0.0.1:5353".to_string()),
            ..Default::default()
        };
        let config = Config::load(None, overrides).unwrap();
        assert_eq!(config.server.dns_bind_address, "127.0.0.1:5353");
    }
}
