use sentinel_domain::{QueryLogEntry, QueryStatus, RecordType};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// `GET /api/query-logs?limit&hours&domain&status` query parameters.
#[derive(Debug, Deserialize)]
pub struct QueryLogsQuery {
    #[serde(default = "default_hours")]
    pub hours: i64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    pub domain: Option<String>,
    pub status: Option<String>,
}

fn default_hours() -> i64 {
    24
}

fn default_limit() -> usize {
    200
}

#[derive(Debug, Serialize)]
pub struct QueryLogResponse {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub domain: String,
    pub record_type: String,
    pub client: Option<String>,
    pub client_ip: String,
    pub status: String,
    pub duration_ms: u32,
    pub answer_ips: Vec<String>,
    pub blocklist_id: Option<String>,
    pub protection_paused: Option<bool>,
}

impl From<&QueryLogEntry> for QueryLogResponse {
    fn from(e: &QueryLogEntry) -> Self {
        Self {
            timestamp: e.timestamp,
            domain: e.domain.to_string(),
            record_type: e.record_type.as_str().to_string(),
            client: e.client.as_ref().map(|c| c.to_string()),
            client_ip: e.client_ip.to_string(),
            status: e.status.as_str().to_string(),
            duration_ms: e.duration_ms,
            answer_ips: e.answer_ips.iter().map(|ip| ip.to_string()).collect(),
            blocklist_id: e.blocklist_id.clone(),
            protection_paused: e.protection_paused,
        }
    }
}

/// `POST /api/query-logs/ingest` body: a batch from a resolver process
/// reporting query outcomes out-of-band (spec §4.6, capped ~5 MiB at this
/// boundary).
#[derive(Debug, Deserialize)]
pub struct IngestQueryLogEntry {
    pub domain: String,
    pub record_type: String,
    pub client_ip: String,
    pub status: String,
    pub duration_ms: u32,
    #[serde(default)]
    pub answer_ips: Vec<String>,
    #[serde(default)]
    pub blocklist_id: Option<String>,
    #[serde(default)]
    pub protection_paused: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct IngestQueryLogsRequest {
    pub entries: Vec<IngestQueryLogEntry>,
}

impl IngestQueryLogEntry {
    pub fn into_entry(self) -> Result<QueryLogEntry, String> {
        let record_type = parse_record_type(&self.record_type);
        let status = parse_status(&self.status).ok_or_else(|| format!("invalid status: {}", self.status))?;
        let answer_ips = self
            .answer_ips
            .iter()
            .filter_map(|s| s.parse::<IpAddr>().ok())
            .collect();

        let mut entry = QueryLogEntry::new(self.domain, record_type, self.client_ip, status, self.duration_ms);
        entry.answer_ips = answer_ips;
        entry.blocklist_id = self.blocklist_id;
        entry.protection_paused = self.protection_paused;
        Ok(entry)
    }
}

fn parse_record_type(s: &str) -> RecordType {
    match s.to_uppercase().as_str() {
        "A" => RecordType::A,
        "AAAA" => RecordType::Aaaa,
        "CNAME" => RecordType::Cname,
        "HTTPS" => RecordType::Https,
        "TXT" => RecordType::Txt,
        "SRV" => RecordType::Srv,
        "MX" => RecordType::Mx,
        "NS" => RecordType::Ns,
        "PTR" => RecordType::Ptr,
        _ => RecordType::Other(0),
    }
}

fn parse_status(s: &str) -> Option<QueryStatus> {
    match s.to_uppercase().as_str() {
        "PERMITTED" => Some(QueryStatus::Permitted),
        "BLOCKED" => Some(QueryStatus::Blocked),
        "SHADOW_BLOCKED" => Some(QueryStatus::ShadowBlocked),
        "CACHED" => Some(QueryStatus::Cached),
        _ => None,
    }
}
