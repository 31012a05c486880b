use async_trait::async_trait;
use sentinel_application::ports::{UpstreamAnswer, UpstreamResolver};
use sentinel_application::AppError;
use std::time::Duration;
use tracing::debug;

/// DNS-over-HTTPS transport (RFC 8484, spec §4.1 default timeout 15000
/// ms). POSTs the wire-format query with `application/dns-message`,
/// reusing the `blocklist` crate's rustls/reqwest stack rather than a
/// second HTTP client implementation.
pub struct DohUpstreamResolver {
    endpoint: String,
    client: reqwest::Client,
}

impl DohUpstreamResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl UpstreamResolver for DohUpstreamResolver {
    async fn forward(&self, query_wire: &[u8], timeout: Duration) -> Result<UpstreamAnswer, AppError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/dns-message")
            .header("Accept", "application/dns-message")
            .body(query_wire.to_vec())
            .send();

        let response = tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| AppError::Upstream(format!("timeout querying DoH endpoint {}", self.endpoint)))?
            .map_err(|e| AppError::Upstream(format!("DoH request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("DoH endpoint returned HTTP {}", response.status())));
        }

        let buf = response.bytes().await.map_err(|e| AppError::Upstream(e.to_string()))?.to_vec();
        let (answer_ips, min_ttl) = super::extract_answer(&buf);
        debug!(endpoint = %self.endpoint, bytes = buf.len(), answers = answer_ips.len(), "DoH upstream query resolved");

        Ok(UpstreamAnswer {
            wire_bytes: buf,
            answer_ips,
            min_ttl,
        })
    }
}
