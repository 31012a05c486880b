use serde::{Deserialize, Serialize};

/// Query-log retention and maintenance cadence (spec §4.6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_retention_days")]
    pub query_log_retention_days: u32,

    #[serde(default = "default_maintenance_batch_size")]
    pub maintenance_batch_size: u32,

    #[serde(default = "default_maintenance_interval_secs")]
    pub maintenance_interval_secs: u64,
}

fn default_retention_days() -> u32 {
    30
}

fn default_maintenance_batch_size() -> u32 {
    10_000
}

fn default_maintenance_interval_secs() -> u64 {
    3600
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            query_log_retention_days: default_retention_days(),
            maintenance_batch_size: default_maintenance_batch_size(),
            maintenance_interval_secs: default_maintenance_interval_secs(),
        }
    }
}

impl RetentionConfig {
    /// Whether the retention maintenance job should run at all (spec §4.6
    /// "disables when retention=0").
    pub fn is_enabled(&self) -> bool {
        self.query_log_retention_days > 0
    }
}
