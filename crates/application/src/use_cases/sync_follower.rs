use crate::cluster_auth::sign;
use crate::errors::AppError;
use crate::ports::{ClusterSnapshot, ClusterSnapshotRepository, ClusterTransport, SyncOutcome};
use chrono::Utc;
use tracing::{info, instrument};

const SYNC_EXPORT_PATH: &str = "/api/cluster/sync/export";

/// One follower-loop tick (spec §4.4 "Follower loop"): issue a signed
/// export request to `leader_url`, apply the result, and return the
/// bookkeeping the jobs crate records as `{lastSync, durationMs,
/// snapshotBytes, counts}`. Callers skip ticks whose effective role is
/// not `follower`; that check lives in `role_resolver`, not here.
#[instrument(skip(transport, repo, psk))]
pub async fn sync_once(
    transport: &dyn ClusterTransport,
    repo: &dyn ClusterSnapshotRepository,
    leader_url: &str,
    psk: &str,
) -> Result<SyncOutcome, AppError> {
    let started = std::time::Instant::now();
    let now = Utc::now();
    let request = sign(psk, "POST", SYNC_EXPORT_PATH, br#"{"want":"full"}"#.to_vec(), now);

    let body = transport.fetch_snapshot(leader_url, request).await?;
    let snapshot: ClusterSnapshot =
        serde_json::from_slice(&body).map_err(|e| AppError::Upstream(format!("invalid snapshot body: {e}")))?;

    let client_count = snapshot.clients.len();
    let rule_count = snapshot.manual_rules.len();
    let snapshot_bytes = body.len();

    repo.apply_snapshot(snapshot).await?;

    let outcome = SyncOutcome {
        last_sync: Utc::now(),
        duration_ms: started.elapsed().as_millis() as u64,
        snapshot_bytes,
        client_count,
        rule_count,
    };
    info!(leader_url, client_count, rule_count, duration_ms = outcome.duration_ms, "follower sync complete");
    Ok(outcome)
}
