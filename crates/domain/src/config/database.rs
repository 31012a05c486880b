use serde::{Deserialize, Serialize};

/// SQLite path and pool tuning (spec §4.5 "Persistence adapter").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_write_pool_max_connections")]
    pub write_pool_max_connections: u32,

    #[serde(default = "default_read_pool_max_connections")]
    pub read_pool_max_connections: u32,

    #[serde(default = "default_query_log_pool_max_connections")]
    pub query_log_pool_max_connections: u32,

    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,

    #[serde(default = "default_statement_timeout_secs")]
    pub statement_timeout_secs: u64,

    #[serde(default = "default_wal_autocheckpoint")]
    pub wal_autocheckpoint: u32,
}

fn default_db_path() -> String {
    "./sentinel.db".to_string()
}

fn default_write_pool_max_connections() -> u32 {
    4
}

fn default_read_pool_max_connections() -> u32 {
    20
}

fn default_query_log_pool_max_connections() -> u32 {
    4
}

fn default_busy_timeout_secs() -> u64 {
    30
}

fn default_statement_timeout_secs() -> u64 {
    30
}

fn default_wal_autocheckpoint() -> u32 {
    10_000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            write_pool_max_connections: default_write_pool_max_connections(),
            read_pool_max_connections: default_read_pool_max_connections(),
            query_log_pool_max_connections: default_query_log_pool_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
            statement_timeout_secs: default_statement_timeout_secs(),
            wal_autocheckpoint: default_wal_autocheckpoint(),
        }
    }
}
