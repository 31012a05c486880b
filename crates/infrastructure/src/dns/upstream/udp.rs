use async_trait::async_trait;
use sentinel_application::ports::{UpstreamAnswer, UpstreamResolver};
use sentinel_application::AppError;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

const MAX_UDP_RESPONSE_SIZE: usize = 4096;
const SOCKET_BUFFER_SIZE: usize = 1 << 20;

/// Default upstream transport (spec §4.1 "Upstream transport selection",
/// default timeout 2000 ms). One socket per query, send/recv buffers
/// tuned via `socket2` so a burst of concurrent queries doesn't drop
/// packets under default OS defaults (spec §5 "UDP socket tuning").
pub struct UdpUpstreamResolver {
    server_addr: SocketAddr,
}

impl UdpUpstreamResolver {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }

    fn tuned_socket(&self) -> std::io::Result<Socket> {
        let domain = if self.server_addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket = Socket::new(domain, Type::DGRAM, None)?;
        socket.set_nonblocking(true)?;
        socket.set_recv_buffer_size(SOCKET_BUFFER_SIZE)?;
        socket.set_send_buffer_size(SOCKET_BUFFER_SIZE)?;
        let bind_addr: SocketAddr = if self.server_addr.is_ipv4() {
            "0.0.0.0:0".parse().unwrap()
        } else {
            "[::]:0".parse().unwrap()
        };
        socket.bind(&bind_addr.into())?;
        Ok(socket)
    }
}

#[async_trait]
impl UpstreamResolver for UdpUpstreamResolver {
    async fn forward(&self, query_wire: &[u8], timeout: Duration) -> Result<UpstreamAnswer, AppError> {
        let std_socket: std::net::UdpSocket = self
            .tuned_socket()
            .map_err(|e| AppError::Upstream(format!("failed to create UDP socket: {e}")))?
            .into();
        let socket = UdpSocket::from_std(std_socket).map_err(|e| AppError::Upstream(format!("failed to create UDP socket: {e}")))?;

        tokio::time::timeout(timeout, socket.send_to(query_wire, self.server_addr))
            .await
            .map_err(|_| AppError::Upstream(format!("timeout sending UDP query to {}", self.server_addr)))?
            .map_err(|e| AppError::Upstream(format!("failed to send UDP query: {e}")))?;

        let mut buf = vec![0u8; MAX_UDP_RESPONSE_SIZE];
        let (len, from) = tokio::time::timeout(timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| AppError::Upstream(format!("timeout waiting for UDP response from {}", self.server_addr)))?
            .map_err(|e| AppError::Upstream(format!("failed to receive UDP response: {e}")))?;

        if from.ip() != self.server_addr.ip() {
            warn!(expected = %self.server_addr, received_from = %from, "UDP response from unexpected source");
        }
        buf.truncate(len);

        let (answer_ips, min_ttl) = super::extract_answer(&buf);
        debug!(server = %self.server_addr, bytes = len, answers = answer_ips.len(), "UDP upstream query resolved");

        Ok(UpstreamAnswer {
            wire_bytes: buf,
            answer_ips,
            min_ttl,
        })
    }
}
