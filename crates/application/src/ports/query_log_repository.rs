use crate::errors::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_domain::QueryLogEntry;

/// One client's share of the window's traffic (spec §4.6 "Metrics
/// aggregation", per-client detail).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientAggregate {
    pub client_ip: String,
    pub total: u64,
    pub blocked: u64,
    pub permitted: u64,
}

/// One 5-minute bucket of the window (spec §4.6, time-series).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeBucket {
    pub bucket_start: DateTime<Utc>,
    pub total: u64,
    pub blocked: u64,
    pub permitted: u64,
}

/// Totals + breakdowns backing the metrics aggregation endpoints (spec
/// §4.6 "Metrics aggregation"). Geo aggregation is a separate port
/// (`GeoLookup`, infrastructure-only) since it depends on an external
/// mmap'd database, not the log store.
#[derive(Debug, Clone, Default)]
pub struct LogAggregates {
    pub total: u64,
    pub blocked: u64,
    pub permitted: u64,
    pub shadow_blocked: u64,
    pub top_domains: Vec<(String, u64)>,
    pub top_blocked: Vec<(String, u64)>,
    pub per_client: Vec<ClientAggregate>,
    pub time_series: Vec<TimeBucket>,
}

#[async_trait]
pub trait QueryLogRepository: Send + Sync {
    /// Append one entry on the resolver hot path (spec §4.6 "Append
    /// path" — single-row insert, not the HTTP batch-ingest shape).
    async fn append(&self, entry: QueryLogEntry) -> Result<(), AppError>;

    /// Server-side expansion of a batched HTTP ingest (spec §4.6, body
    /// capped ~5 MiB at the `api` crate boundary, not here).
    async fn append_batch(&self, entries: Vec<QueryLogEntry>) -> Result<(), AppError>;

    async fn query(
        &self,
        since: DateTime<Utc>,
        domain: Option<&str>,
        status: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QueryLogEntry>, AppError>;

    async fn aggregates(&self, since: DateTime<Utc>, exclude_hostnames: &[String]) -> Result<LogAggregates, AppError>;

    /// Delete rows older than `cutoff` in batches of at most
    /// `batch_size`, returning the number of rows removed (spec §4.6
    /// "Retention"). Callers loop this until it returns 0.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>, batch_size: usize) -> Result<u64, AppError>;
}
