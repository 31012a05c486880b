use serde::{Deserialize, Serialize};

/// Static HA defaults (spec §4.4). The live role/leader-url pair is a
/// settings singleton (`cluster::ClusterConfig`); this struct only carries
/// operational knobs that don't change at runtime.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusterSettingsConfig {
    #[serde(default = "default_role_override_path")]
    pub role_override_path: String,

    #[serde(default = "default_join_code_ttl_minutes")]
    pub join_code_ttl_minutes: i64,

    #[serde(default = "default_clock_skew_tolerance_secs")]
    pub clock_skew_tolerance_secs: i64,

    #[serde(default = "default_nonce_cache_size")]
    pub nonce_cache_size: usize,

    #[serde(default = "default_nonce_ttl_secs")]
    pub nonce_ttl_secs: u64,

    #[serde(default = "default_follower_sync_interval_secs")]
    pub follower_sync_interval_secs: u64,

    #[serde(default = "default_follower_ready_staleness_secs")]
    pub follower_ready_staleness_secs: i64,
}

fn default_role_override_path() -> String {
    "/data/ha-role-override".to_string()
}

fn default_join_code_ttl_minutes() -> i64 {
    60
}

fn default_clock_skew_tolerance_secs() -> i64 {
    120
}

fn default_nonce_cache_size() -> usize {
    5000
}

fn default_nonce_ttl_secs() -> u64 {
    120
}

fn default_follower_sync_interval_secs() -> u64 {
    5
}

fn default_follower_ready_staleness_secs() -> i64 {
    20
}

impl Default for ClusterSettingsConfig {
    fn default() -> Self {
        Self {
            role_override_path: default_role_override_path(),
            join_code_ttl_minutes: default_join_code_ttl_minutes(),
            clock_skew_tolerance_secs: default_clock_skew_tolerance_secs(),
            nonce_cache_size: default_nonce_cache_size(),
            nonce_ttl_secs: default_nonce_ttl_secs(),
            follower_sync_interval_secs: default_follower_sync_interval_secs(),
            follower_ready_staleness_secs: default_follower_ready_staleness_secs(),
        }
    }
}
