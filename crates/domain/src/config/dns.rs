use crate::settings::ForwardTransport;
use serde::{Deserialize, Serialize};

/// Static defaults for upstream forwarding (spec §4.1). The mutable
/// per-deployment `dns_settings` singleton (`settings::DnsForwardSettings`)
/// is seeded from this at first boot and then lives in persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DnsConfig {
    #[serde(default = "default_upstream_servers")]
    pub upstream_servers: Vec<String>,

    #[serde(default)]
    pub transport: ForwardTransport,

    #[serde(default = "default_udp_timeout_ms")]
    pub udp_timeout_ms: u64,

    #[serde(default = "default_tcp_timeout_ms")]
    pub tcp_timeout_ms: u64,

    #[serde(default = "default_dot_timeout_ms")]
    pub dot_timeout_ms: u64,

    #[serde(default = "default_doh_timeout_ms")]
    pub doh_timeout_ms: u64,

    #[serde(default = "default_true")]
    pub prefer_ipv4_for_doh: bool,

    #[serde(default = "default_true")]
    pub response_cache_enabled: bool,

    #[serde(default = "default_cache_max_entries")]
    pub response_cache_max_entries: usize,
}

impl Default for ForwardTransport {
    fn default() -> Self {
        ForwardTransport::Udp
    }
}

fn default_upstream_servers() -> Vec<String> {
    vec!["1.1.1.1:53".to_string(), "8.8.8.8:53".to_string()]
}

fn default_udp_timeout_ms() -> u64 {
    2000
}

fn default_tcp_timeout_ms() -> u64 {
    4000
}

fn default_dot_timeout_ms() -> u64 {
    4000
}

fn default_doh_timeout_ms() -> u64 {
    15000
}

fn default_true() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    50_000
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            upstream_servers: default_upstream_servers(),
            transport: ForwardTransport::Udp,
            udp_timeout_ms: default_udp_timeout_ms(),
            tcp_timeout_ms: default_tcp_timeout_ms(),
            dot_timeout_ms: default_dot_timeout_ms(),
            doh_timeout_ms: default_doh_timeout_ms(),
            prefer_ipv4_for_doh: true,
            response_cache_enabled: true,
            response_cache_max_entries: default_cache_max_entries(),
        }
    }
}
