use crate::cluster_auth::SignedRequest;
use crate::errors::AppError;
use async_trait::async_trait;

/// HTTP transport for the cluster-internal sync request (spec §4.4
/// "Cluster-internal transport"). Signing/verification is pure
/// application logic (`cluster_auth`); this port only moves already-
/// signed bytes over the wire.
#[async_trait]
pub trait ClusterTransport: Send + Sync {
    /// POST the signed `/api/cluster/sync/export` request to `leader_url`
    /// and return the raw JSON response body.
    async fn fetch_snapshot(&self, leader_url: &str, request: SignedRequest) -> Result<Vec<u8>, AppError>;
}
