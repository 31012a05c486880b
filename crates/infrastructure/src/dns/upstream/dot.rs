use async_trait::async_trait;
use rustls::pki_types::ServerName;
use sentinel_application::ports::{UpstreamAnswer, UpstreamResolver};
use sentinel_application::AppError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

const MAX_RESPONSE_SIZE: usize = 65535;

/// DNS-over-TLS transport (spec §4.1, default timeout 4000 ms). Same
/// 2-byte length-prefixed framing as plain TCP, wrapped in a TLS session
/// validated against the webpki roots bundle.
pub struct DotUpstreamResolver {
    server_addr: SocketAddr,
    server_name: ServerName<'static>,
    connector: TlsConnector,
}

impl DotUpstreamResolver {
    pub fn new(server_addr: SocketAddr, hostname: &str) -> Result<Self, AppError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name = ServerName::try_from(hostname.to_string())
            .map_err(|_| AppError::InvalidInput(format!("invalid DoT server name: {hostname}")))?;

        Ok(Self {
            server_addr,
            server_name,
            connector: TlsConnector::from(Arc::new(config)),
        })
    }
}

#[async_trait]
impl UpstreamResolver for DotUpstreamResolver {
    async fn forward(&self, query_wire: &[u8], timeout: Duration) -> Result<UpstreamAnswer, AppError> {
        let connect = async {
            let tcp = TcpStream::connect(self.server_addr).await?;
            self.connector.connect(self.server_name.clone(), tcp).await
        };
        let mut stream = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| AppError::Upstream(format!("timeout establishing DoT session to {}", self.server_addr)))?
            .map_err(|e| AppError::Upstream(format!("DoT handshake failed: {e}")))?;

        let len = u16::try_from(query_wire.len())
            .map_err(|_| AppError::Upstream("query too large for DoT framing".to_string()))?;

        let write = async {
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(query_wire).await
        };
        tokio::time::timeout(timeout, write)
            .await
            .map_err(|_| AppError::Upstream("timeout writing DoT query".to_string()))?
            .map_err(|e| AppError::Upstream(format!("failed to write DoT query: {e}")))?;

        let read = async {
            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let response_len = u16::from_be_bytes(len_buf) as usize;
            if response_len > MAX_RESPONSE_SIZE {
                return Err(std::io::Error::other("DoT response exceeds maximum size"));
            }
            let mut buf = vec![0u8; response_len];
            stream.read_exact(&mut buf).await?;
            Ok(buf)
        };
        let buf = tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| AppError::Upstream("timeout reading DoT response".to_string()))?
            .map_err(|e| AppError::Upstream(format!("failed to read DoT response: {e}")))?;

        let (answer_ips, min_ttl) = super::extract_answer(&buf);
        debug!(server = %self.server_addr, bytes = buf.len(), answers = answer_ips.len(), "DoT upstream query resolved");

        Ok(UpstreamAnswer {
            wire_bytes: buf,
            answer_ips,
            min_ttl,
        })
    }
}
