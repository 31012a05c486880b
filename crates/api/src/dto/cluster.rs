use sentinel_domain::ClusterRole;
use serde::{Deserialize, Serialize};

/// The `cluster_config` settings record (spec §3 "Cluster config"),
/// stored under a `cluster_`-prefixed key so snapshot export strips it
/// (spec §4.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfigRecord {
    pub enabled: bool,
    pub role: ClusterRole,
    pub leader_url: Option<String>,
}

impl Default for ClusterConfigRecord {
    fn default() -> Self {
        Self {
            enabled: false,
            role: ClusterRole::Standalone,
            leader_url: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterStatusResponse {
    pub enabled: bool,
    pub role: ClusterRole,
    pub leader_url: Option<String>,
}

impl From<&ClusterConfigRecord> for ClusterStatusResponse {
    fn from(c: &ClusterConfigRecord) -> Self {
        Self {
            enabled: c.enabled,
            role: c.role,
            leader_url: c.leader_url.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub role: ClusterRole,
}

#[derive(Debug, Serialize)]
pub struct PeerStatusResponse {
    pub role: ClusterRole,
    pub enabled: bool,
    pub last_sync: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Serialize)]
pub struct NetInfoResponse {
    pub hostname: String,
    pub leader_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EnableLeaderRequest {
    /// An externally reachable URL for this node, embedded in issued join
    /// codes (spec §6 "Join-code format").
    pub leader_url: String,
}

#[derive(Debug, Serialize)]
pub struct EnableLeaderResponse {
    pub join_code: String,
}

#[derive(Debug, Serialize)]
pub struct JoinCodeResponse {
    pub join_code: String,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureFollowerRequest {
    pub join_code: String,
}

#[derive(Debug, Deserialize)]
pub struct SyncExportRequest {
    pub want: String,
}
