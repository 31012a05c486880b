use sentinel_application::ports::{ClusterSnapshotRepository, ClusterTransport, RoleOverrideReader};
use sentinel_application::use_cases::sync_once;
use sentinel_domain::ClusterRole;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// The follower loop (spec §4.4 "Follower loop"): on every tick, resolves
/// the effective role (stored role + filesystem override) and, while
/// that's `follower`, pulls and applies a snapshot from the leader.
/// Skips ticks entirely outside that role rather than treating the skip
/// as an error.
pub struct FollowerSyncJob {
    transport: Arc<dyn ClusterTransport>,
    repo: Arc<dyn ClusterSnapshotRepository>,
    role_override: Arc<dyn RoleOverrideReader>,
    stored_role: ClusterRole,
    leader_url: String,
    psk: String,
    interval_secs: u64,
    shutdown: CancellationToken,
    last_sync: Arc<Mutex<Option<chrono::DateTime<chrono::Utc>>>>,
}

impl FollowerSyncJob {
    pub fn new(
        transport: Arc<dyn ClusterTransport>,
        repo: Arc<dyn ClusterSnapshotRepository>,
        role_override: Arc<dyn RoleOverrideReader>,
        stored_role: ClusterRole,
        leader_url: String,
        psk: String,
    ) -> Self {
        Self {
            transport,
            repo,
            role_override,
            stored_role,
            leader_url,
            psk,
            interval_secs: 10,
            shutdown: CancellationToken::new(),
            last_sync: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Last successful sync time, consulted by `role_resolver::is_ready`.
    pub fn last_sync(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        *self.last_sync.lock().expect("follower sync mutex is never poisoned")
    }

    /// A handle the admin surface's readiness endpoint can poll directly
    /// without holding a reference to the job itself.
    pub fn shared_last_sync(&self) -> Arc<Mutex<Option<chrono::DateTime<chrono::Utc>>>> {
        self.last_sync.clone()
    }

    pub async fn start(self: Arc<Self>) {
        if self.stored_role != ClusterRole::Follower {
            info!("FollowerSyncJob: stored role is not follower, not starting");
            return;
        }

        info!(leader_url = %self.leader_url, interval_secs = self.interval_secs, "Starting cluster follower sync job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("FollowerSyncJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.tick().await;
                    }
                }
            }
        });
    }

    async fn tick(&self) {
        let effective = self.role_override.read().unwrap_or(self.stored_role);
        if effective != ClusterRole::Follower {
            return;
        }

        match sync_once(self.transport.as_ref(), self.repo.as_ref(), &self.leader_url, &self.psk).await {
            Ok(outcome) => {
                *self.last_sync.lock().expect("follower sync mutex is never poisoned") = Some(outcome.last_sync);
                info!(
                    duration_ms = outcome.duration_ms,
                    snapshot_bytes = outcome.snapshot_bytes,
                    clients = outcome.client_count,
                    rules = outcome.rule_count,
                    "follower sync completed"
                );
            }
            Err(e) => error!(error = %e, "follower sync failed"),
        }
    }
}
