use crate::dns_record::RecordType;
use chrono::{DateTime, Utc};
use std::net::IpAddr;
use std::sync::Arc;

/// Outcome of a single query decision (spec §1, §4.1 state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    Permitted,
    Blocked,
    ShadowBlocked,
    Cached,
}

impl QueryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryStatus::Permitted => "PERMITTED",
            QueryStatus::Blocked => "BLOCKED",
            QueryStatus::ShadowBlocked => "SHADOW_BLOCKED",
            QueryStatus::Cached => "CACHED",
        }
    }
}

impl std::fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row appended to the query log after every decision (spec §3 "Query
/// log entry", §4.6 "Append path").
#[derive(Debug, Clone)]
pub struct QueryLogEntry {
    pub timestamp: DateTime<Utc>,
    pub domain: Arc<str>,
    pub record_type: RecordType,
    pub client: Option<Arc<str>>,
    pub client_ip: Arc<str>,
    pub status: QueryStatus,
    pub duration_ms: u32,
    pub answer_ips: Vec<IpAddr>,
    pub blocklist_id: Option<String>,
    pub protection_paused: Option<bool>,
}

impl QueryLogEntry {
    pub fn new(
        domain: impl Into<Arc<str>>,
        record_type: RecordType,
        client_ip: impl Into<Arc<str>>,
        status: QueryStatus,
        duration_ms: u32,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            domain: domain.into(),
            record_type,
            client: None,
            client_ip: client_ip.into(),
            status,
            duration_ms,
            answer_ips: Vec::new(),
            blocklist_id: None,
            protection_paused: None,
        }
    }
}
