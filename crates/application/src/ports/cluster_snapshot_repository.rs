use crate::errors::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_domain::{Blocklist, ClientProfile, Rule};
use serde_json::Value;
use std::sync::Arc;

/// A versioned snapshot of C5 state (spec §4.4 "Snapshot export"). Secrets
/// travel as re-encrypted ciphertext blobs the follower decrypts with its
/// own key, not plaintext, to avoid a plaintext-at-rest-in-transit window
/// beyond what `secret:<name>` already accepts.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClusterSnapshot {
    pub version: u32,
    pub settings: Vec<(String, Value)>,
    pub clients: Vec<SnapshotClient>,
    pub manual_rules: Vec<SnapshotRule>,
    pub blocklists: Vec<Blocklist>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SnapshotClient {
    pub id: i64,
    pub profile_json: Value,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SnapshotRule {
    pub domain: String,
    pub rule_type: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Outcome of one follower sync iteration (spec §4.4 "Follower loop").
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub last_sync: DateTime<Utc>,
    pub duration_ms: u64,
    pub snapshot_bytes: usize,
    pub client_count: usize,
    pub rule_count: usize,
}

/// Leader export + follower apply, transactionally (spec §4.4 "Snapshot
/// apply"). Settings excluded from export (`secret:*`, `cluster_*`) are
/// filtered by the implementation before this port ever sees them.
#[async_trait]
pub trait ClusterSnapshotRepository: Send + Sync {
    async fn export_snapshot(&self) -> Result<ClusterSnapshot, AppError>;

    /// Apply an incoming snapshot: upsert settings (preserving
    /// `auth_admin` sessions iff the password hash is unchanged),
    /// converge clients (delete-then-upsert), replace non-blocklist
    /// rules, truncate-and-reinsert blocklists preserving ids, and
    /// out-of-transaction re-encrypt secrets with the follower's key.
    async fn apply_snapshot(&self, snapshot: ClusterSnapshot) -> Result<(), AppError>;

    async fn client_profiles_raw(&self) -> Result<Vec<Arc<ClientProfile>>, AppError>;
    async fn manual_rules_raw(&self) -> Result<Vec<Rule>, AppError>;
}
