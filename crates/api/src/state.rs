use crate::dto::cluster::ClusterConfigRecord;
use sentinel_application::cluster_auth::NonceCache;
use sentinel_application::policy::PolicyEngine;
use sentinel_application::ports::{
    BlocklistFetcher, BlocklistRepository, ClientRepository, ClusterSnapshotRepository, ClusterTransport,
    QueryLogRepository, ResponseCachePort, RewriteRepository, RoleOverrideReader, RuleRepository, SecretStore,
    SettingsRepository,
};
use std::sync::{Arc, Mutex};

const SETTINGS_KEY_CLUSTER_CONFIG: &str = "cluster_config";

/// Everything an admin-surface handler needs (spec §6). Assembled once by
/// the composition root and cloned cheaply per request (every field is an
/// `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PolicyEngine>,
    pub rules: Arc<dyn RuleRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub rewrites: Arc<dyn RewriteRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub blocklists: Arc<dyn BlocklistRepository>,
    pub blocklist_fetcher: Arc<dyn BlocklistFetcher>,
    pub query_log: Arc<dyn QueryLogRepository>,
    pub cluster_snapshot: Arc<dyn ClusterSnapshotRepository>,
    pub cluster_transport: Arc<dyn ClusterTransport>,
    pub role_override: Arc<dyn RoleOverrideReader>,
    pub secrets: Arc<dyn SecretStore>,
    pub nonces: Arc<NonceCache>,
    pub response_cache: Arc<dyn ResponseCachePort>,
    /// Updated in place by the follower sync job; shared so the
    /// readiness endpoint never has to reach into the job itself.
    pub last_sync: Arc<Mutex<Option<chrono::DateTime<chrono::Utc>>>>,
    /// Shared secret guarding every admin request. Full session/login
    /// storage is out of scope for this surface; a single static bearer
    /// key is the minimal ambient auth it carries.
    pub api_key: Arc<str>,
    /// `cluster.join_code_ttl_minutes` (spec §4.4 "Join code"), threaded
    /// through to `accept_join_code` instead of a hardcoded constant.
    pub join_code_ttl_minutes: i64,
}

impl AppState {
    /// Reads the `cluster_config` settings record, defaulting to a
    /// disabled standalone node when unset.
    pub async fn cluster_config(&self) -> ClusterConfigRecord {
        match self.settings.get_raw(SETTINGS_KEY_CLUSTER_CONFIG).await {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
            _ => ClusterConfigRecord::default(),
        }
    }

    pub async fn put_cluster_config(&self, config: &ClusterConfigRecord) -> Result<(), sentinel_application::AppError> {
        let value = serde_json::to_value(config).map_err(|e| sentinel_application::AppError::Database(e.to_string()))?;
        self.settings.put_raw(SETTINGS_KEY_CLUSTER_CONFIG, value).await
    }
}
