use sentinel_domain::RecordType;
use std::net::IpAddr;

/// A hit from the response cache: the wire-format bytes to relay back
/// verbatim, plus the answer IPs the query log needs (spec §4.1
/// "Response cache").
pub struct CachedAnswer {
    pub wire_bytes: Vec<u8>,
    pub answer_ips: Vec<IpAddr>,
}

/// Hit/miss counters exposed via `GET /api/cache/stats` (SPEC_FULL §5).
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub entries: usize,
}

/// Port for C1's process-local response cache. Sync rather than async:
/// every implementation is an in-memory map guarded by a short-lived
/// lock, never I/O (spec §5 "Response cache is concurrent map with
/// per-key last-writer-wins").
pub trait ResponseCachePort: Send + Sync {
    fn get(&self, name: &str, record_type: RecordType) -> Option<CachedAnswer>;

    /// `min_ttl` of `None` or `Some(0)` means "do not cache" (spec §4.1).
    fn put(&self, name: &str, record_type: RecordType, wire_bytes: Vec<u8>, answer_ips: Vec<IpAddr>, min_ttl: Option<u32>);

    fn stats(&self) -> CacheStatsSnapshot;
}
