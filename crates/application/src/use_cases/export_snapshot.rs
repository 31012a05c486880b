use crate::cluster_auth::{verify, NonceCache, SignedRequest};
use crate::errors::AppError;
use crate::ports::{ClusterSnapshot, ClusterSnapshotRepository};
use chrono::{DateTime, Utc};

/// Leader side of C4: verify the inbound signed request, then hand back
/// the current snapshot (spec §4.4 "Snapshot export", "Cluster-internal
/// transport"). Verification failure (skew or replay) is the caller's
/// 401, surfaced here as `TimestampSkewOrReplay`.
pub async fn export_snapshot(
    repo: &dyn ClusterSnapshotRepository,
    psk: &str,
    request: &SignedRequest,
    nonces: &NonceCache,
    now: DateTime<Utc>,
) -> Result<ClusterSnapshot, AppError> {
    if !verify(psk, request, nonces, now) {
        return Err(AppError::TimestampSkewOrReplay);
    }
    repo.export_snapshot().await
}
