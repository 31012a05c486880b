use async_trait::async_trait;
use sentinel_application::ports::{UpstreamAnswer, UpstreamResolver};
use sentinel_application::AppError;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

const MAX_TCP_RESPONSE_SIZE: usize = 65535;

/// DNS-over-TCP transport (spec §4.1 "Upstream transport selection",
/// default timeout 4000 ms). Frames with the 2-byte length prefix RFC
/// 1035 §4.2.2 requires over stream transports.
pub struct TcpUpstreamResolver {
    server_addr: SocketAddr,
}

impl TcpUpstreamResolver {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl UpstreamResolver for TcpUpstreamResolver {
    async fn forward(&self, query_wire: &[u8], timeout: Duration) -> Result<UpstreamAnswer, AppError> {
        let connect = TcpStream::connect(self.server_addr);
        let mut stream = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| AppError::Upstream(format!("timeout connecting to {}", self.server_addr)))?
            .map_err(|e| AppError::Upstream(format!("failed to connect to {}: {e}", self.server_addr)))?;

        let len = u16::try_from(query_wire.len())
            .map_err(|_| AppError::Upstream("query too large for TCP framing".to_string()))?;

        let write = async {
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(query_wire).await
        };
        tokio::time::timeout(timeout, write)
            .await
            .map_err(|_| AppError::Upstream("timeout writing TCP query".to_string()))?
            .map_err(|e| AppError::Upstream(format!("failed to write TCP query: {e}")))?;

        let read = async {
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let response_len = u16::from_be_bytes(len_buf) as usize;
            if response_len > MAX_TCP_RESPONSE_SIZE {
                return Err(std::io::Error::other("TCP response exceeds maximum size"));
            }
            let mut buf = vec![0u8; response_len];
            stream.read_exact(&mut buf).await?;
            Ok(buf)
        };
        let buf = tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| AppError::Upstream("timeout reading TCP response".to_string()))?
            .map_err(|e| AppError::Upstream(format!("failed to read TCP response: {e}")))?;

        let (answer_ips, min_ttl) = super::extract_answer(&buf);
        debug!(server = %self.server_addr, bytes = buf.len(), answers = answer_ips.len(), "TCP upstream query resolved");

        Ok(UpstreamAnswer {
            wire_bytes: buf,
            answer_ips,
            min_ttl,
        })
    }
}
