use crate::errors::AppError;
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

/// Wire-format answer from the upstream resolver (spec §4.1 "Answer
/// synthesis" — C1 decodes these into a reply, this port never does).
#[derive(Debug, Clone)]
pub struct UpstreamAnswer {
    pub wire_bytes: Vec<u8>,
    pub answer_ips: Vec<IpAddr>,
    pub min_ttl: Option<u32>,
}

/// Port for C1's upstream forwarding step. One implementation per
/// transport (`udp`/`tcp`/`dot`/`doh`) lives in `infrastructure`, selected
/// at construction time from `DnsForwardSettings::transport`.
#[async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Forward `query_wire` (a complete wire-format DNS message) upstream
    /// and return the response. Implementations apply their own
    /// transport-specific timeout (spec §4.1 defaults 2000/4000/4000/
    /// 15000 ms) and must never block past it.
    async fn forward(&self, query_wire: &[u8], timeout: Duration) -> Result<UpstreamAnswer, AppError>;
}
