use async_trait::async_trait;
use sentinel_application::cluster_auth::SignedRequest;
use sentinel_application::ports::ClusterTransport;
use sentinel_application::AppError;
use std::time::Duration;
use tracing::{error, instrument};

const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Cluster-internal HTTP transport (spec §4.4 "Cluster-internal
/// transport"). Carries an already-signed request; this type never
/// touches `cluster_auth` itself.
pub struct ReqwestClusterTransport {
    client: reqwest::Client,
}

impl ReqwestClusterTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(SYNC_TIMEOUT)
            .build()
            .expect("reqwest client with static config always builds");
        Self { client }
    }
}

impl Default for ReqwestClusterTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterTransport for ReqwestClusterTransport {
    #[instrument(skip(self, request))]
    async fn fetch_snapshot(&self, leader_url: &str, request: SignedRequest) -> Result<Vec<u8>, AppError> {
        let url = format!("{}{}", leader_url.trim_end_matches('/'), request.path);

        let response = self
            .client
            .post(&url)
            .header("X-Sentinel-Timestamp", request.timestamp_ms.to_string())
            .header("X-Sentinel-Nonce", &request.nonce)
            .header("X-Sentinel-Signature", &request.signature)
            .header("Content-Type", "application/json")
            .body(request.body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, %url, "cluster sync request failed");
                AppError::Upstream(e.to_string())
            })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("cluster sync returned HTTP {}", response.status())));
        }

        response.bytes().await.map(|b| b.to_vec()).map_err(|e| AppError::Upstream(e.to_string()))
    }
}
