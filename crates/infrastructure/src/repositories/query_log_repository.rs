use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_application::ports::{ClientAggregate, LogAggregates, QueryLogRepository, TimeBucket};
use sentinel_application::AppError;
use sentinel_domain::{QueryLogEntry, QueryStatus, RecordType};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 10_000;
const MAX_BATCH_SIZE: usize = 500;
const FLUSH_INTERVAL_MS: u64 = 100;

/// JSON shape of the `query_logs.entry` column (spec §3 "Query log
/// entry"). Field names are camelCase to match the expression indexes in
/// the schema migration (`entry->>'domain'`, `entry->>'clientIp'`,
/// `entry->>'status'`).
#[derive(Debug, Serialize, Deserialize)]
struct LogEntryJson {
    domain: String,
    #[serde(rename = "type")]
    record_type: String,
    client: Option<String>,
    #[serde(rename = "clientIp")]
    client_ip: String,
    status: String,
    #[serde(rename = "durationMs")]
    duration_ms: u32,
    #[serde(rename = "answerIps")]
    answer_ips: Vec<String>,
    #[serde(rename = "blocklistId")]
    blocklist_id: Option<String>,
    #[serde(rename = "protectionPaused")]
    protection_paused: Option<bool>,
}

impl From<&QueryLogEntry> for LogEntryJson {
    fn from(e: &QueryLogEntry) -> Self {
        Self {
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

fn status_from_str(s: &str) -> Option<QueryStatus> {
    match s {
        "PERMITTED" => Some(QueryStatus::Permitted),
        "BLOCKED" => Some(QueryStatus::Blocked),
        "SHADOW_BLOCKED" => Some(QueryStatus::ShadowBlocked),
        "CACHED" => Some(QueryStatus::Cached),
        _ => None,
    }
}

fn record_type_from_str(s: &str) -> RecordType {
    s.parse().unwrap_or(RecordType::Other(0))
}

fn row_to_entry(timestamp: String, raw: String) -> Option<QueryLogEntry> {
    let json: LogEntryJson = serde_json::from_str(&raw).ok()?;
    Some(QueryLogEntry {
        timestamp: DateTime::parse_from_rfc3339(&timestamp).ok()?.with_timezone(&Utc),
        domain: json.domain.as_str().into(),
        record_type: record_type_from_str(&json.record_type),
        client: json.client.map(|c| c.as_str().into()),
        client_ip: json.client_ip.as_str().into(),
        status: status_from_str(&json.status)?,
        duration_ms: json.duration_ms,
        answer_ips: json.answer_ips.iter().filter_map(|s| s.parse::<IpAddr>().ok()).collect(),
        blocklist_id: json.blocklist_id,
        protection_paused: json.protection_paused,
    })
}

/// Append path for C6 (spec §4.6). The resolver hot path never waits on a
/// disk write: entries go through a bounded channel and a background task
/// batches them into one multi-row insert, the same shape as the
/// teacher's query-log batching.
pub struct SqliteQueryLogRepository {
    pool: SqlitePool,
    sender: mpsc::Sender<(DateTime<Utc>, LogEntryJson)>,
}

impl SqliteQueryLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);

        let flush_pool = pool.clone();
        tokio::spawn(async move {
            Self::flush_loop(flush_pool, receiver).await;
        });

        info!(
            channel_capacity = CHANNEL_CAPACITY,
            batch_size = MAX_BATCH_SIZE,
            flush_interval_ms = FLUSH_INTERVAL_MS,
            "query log batching enabled"
        );

        Self { pool, sender }
    }

    async fn flush_loop(pool: SqlitePool, mut receiver: mpsc::Receiver<(DateTime<Utc>, LogEntryJson)>) {
        let mut batch = Vec::with_capacity(MAX_BATCH_SIZE);
        let mut flush_interval = tokio::time::interval(Duration::from_millis(FLUSH_INTERVAL_MS));

        loop {
            tokio::select! {
                maybe_entry = receiver.recv() => {
                    match maybe_entry {
                        Some(entry) => {
                            batch.push(entry);
                            while batch.len() < MAX_BATCH_SIZE {
                                match receiver.try_recv() {
                                    Ok(e) => batch.push(e),
                                    Err(_) => break,
                                }
                            }
                            if batch.len() >= MAX_BATCH_SIZE {
                                Self::flush_batch(&pool, &mut batch).await;
                            }
                        }
                        None => {
                            if !batch.is_empty() {
                                Self::flush_batch(&pool, &mut batch).await;
                            }
                            info!("query log flush task shutting down");
                            return;
                        }
                    }
                }
                _ = flush_interval.tick() => {
                    if !batch.is_empty() {
                        Self::flush_batch(&pool, &mut batch).await;
                    }
                }
            }
        }
    }

    async fn flush_batch(pool: &SqlitePool, batch: &mut Vec<(DateTime<Utc>, LogEntryJson)>) {
        let count = batch.len();
        if count == 0 {
            return;
        }

        let mut sql = String::from("INSERT INTO query_logs (timestamp, entry) VALUES ");
        for i in 0..count {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str("(?, ?)");
        }

        let mut query = sqlx::query(&sql);
        for (timestamp, entry) in batch.iter() {
            let raw = serde_json::to_string(entry).unwrap_or_else(|_| "{}".to_string());
            query = query.bind(timestamp.to_rfc3339()).bind(raw);
        }

        match query.execute(pool).await {
            Ok(_) => debug!(count, "query log batch flushed"),
            Err(e) => error!(error = %e, count, "failed to flush query log batch"),
        }

        batch.clear();
    }
}

#[async_trait]
impl QueryLogRepository for SqliteQueryLogRepository {
    async fn append(&self, entry: QueryLogEntry) -> Result<(), AppError> {
        let timestamp = entry.timestamp;
        let json = LogEntryJson::from(&entry);
        match self.sender.try_send((timestamp, json)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("query log channel full, dropping entry");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("query log channel closed");
                Ok(())
            }
        }
    }

    async fn append_batch(&self, entries: Vec<QueryLogEntry>) -> Result<(), AppError> {
        let mut batch: Vec<(DateTime<Utc>, LogEntryJson)> =
            entries.iter().map(|e| (e.timestamp, LogEntryJson::from(e))).collect();
        Self::flush_batch(&self.pool, &mut batch).await;
        Ok(())
    }

    async fn query(
        &self,
        since: DateTime<Utc>,
        domain: Option<&str>,
        status: Option<&str>,
        limit: usize,
    ) -> Result<Vec<QueryLogEntry>, AppError> {
        let mut sql = String::from("SELECT timestamp, entry FROM query_logs WHERE timestamp >= ?");
        if domain.is_some() {
            sql.push_str(" AND json_extract(entry, '$.domain') = ?");
        }
        if status.is_some() {
            sql.push_str(" AND json_extract(entry, '$.status') = ?");
        }
        sql.push_str(" ORDER BY timestamp DESC LIMIT ?");

        let mut query = sqlx::query(&sql).bind(since.to_rfc3339());
        if let Some(d) = domain {
            query = query.bind(d.to_string());
        }
        if let Some(s) = status {
            query = query.bind(s.to_string());
        }
        query = query.bind(limit as i64);

        let rows = query.fetch_all(&self.pool).await.map_err(|e| {
            error!(error = %e, "failed to query log entries");
            AppError::Database(e.to_string())
        })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row_to_entry(row.get("timestamp"), row.get("entry")))
            .collect())
    }

    async fn aggregates(&self, since: DateTime<Utc>, exclude_hostnames: &[String]) -> Result<LogAggregates, AppError> {
        let totals: (i64, i64, i64, i64) = sqlx::query_as(
            "SELECT
                COUNT(*),
                SUM(CASE WHEN json_extract(entry, '$.status') = 'BLOCKED' THEN 1 ELSE 0 END),
                SUM(CASE WHEN json_extract(entry, '$.status') = 'PERMITTED' THEN 1 ELSE 0 END),
                SUM(CASE WHEN json_extract(entry, '$.status') = 'SHADOW_BLOCKED' THEN 1 ELSE 0 END)
             FROM query_logs WHERE timestamp >= ?",
        )
        .bind(since.to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let exclusion_clause = if exclude_hostnames.is_empty() {
            String::new()
        } else {
            let placeholders = exclude_hostnames.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
            format!(" AND json_extract(entry, '$.domain') NOT IN ({placeholders})")
        };

        let top_domains_sql = format!(
            "SELECT json_extract(entry, '$.domain') AS d, COUNT(*) AS c FROM query_logs
             WHERE timestamp >= ?{exclusion_clause} GROUP BY d ORDER BY c DESC LIMIT 10"
        );
        let mut q = sqlx::query_as::<_, (String, i64)>(&top_domains_sql).bind(since.to_rfc3339());
        for h in exclude_hostnames {
            q = q.bind(h);
        }
        let top_domains = q.fetch_all(&self.pool).await.map_err(|e| AppError::Database(e.to_string()))?;

        let top_blocked = sqlx::query_as::<_, (String, i64)>(
            "SELECT json_extract(entry, '$.domain') AS d, COUNT(*) AS c FROM query_logs
             WHERE timestamp >= ? AND json_extract(entry, '$.status') IN ('BLOCKED', 'SHADOW_BLOCKED')
             GROUP BY d ORDER BY c DESC LIMIT 10",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let per_client_rows: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT
                json_extract(entry, '$.clientIp') AS client_ip,
                COUNT(*),
                SUM(CASE WHEN json_extract(entry, '$.status') IN ('BLOCKED', 'SHADOW_BLOCKED') THEN 1 ELSE 0 END),
                SUM(CASE WHEN json_extract(entry, '$.status') = 'PERMITTED' THEN 1 ELSE 0 END)
             FROM query_logs WHERE timestamp >= ?
             GROUP BY client_ip ORDER BY 2 DESC LIMIT 50",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        // 5-minute buckets (spec §4.6 time-series): floor each entry's unix
        // timestamp to the nearest 300s, group, and carry the bucket start
        // back out as an epoch second for the caller to interpret.
        let time_series_rows: Vec<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT
                (CAST(strftime('%s', timestamp) AS INTEGER) / 300) * 300 AS bucket,
                COUNT(*),
                SUM(CASE WHEN json_extract(entry, '$.status') IN ('BLOCKED', 'SHADOW_BLOCKED') THEN 1 ELSE 0 END),
                SUM(CASE WHEN json_extract(entry, '$.status') = 'PERMITTED' THEN 1 ELSE 0 END)
             FROM query_logs WHERE timestamp >= ?
             GROUP BY bucket ORDER BY bucket ASC",
        )
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(LogAggregates {
            total: totals.0.max(0) as u64,
            blocked: totals.1.max(0) as u64,
            permitted: totals.2.max(0) as u64,
            shadow_blocked: totals.3.max(0) as u64,
            top_domains: top_domains.into_iter().map(|(d, c)| (d, c.max(0) as u64)).collect(),
            top_blocked: top_blocked.into_iter().map(|(d, c)| (d, c.max(0) as u64)).collect(),
            per_client: per_client_rows
                .into_iter()
                .map(|(client_ip, total, blocked, permitted)| ClientAggregate {
                    client_ip,
                    total: total.max(0) as u64,
                    blocked: blocked.max(0) as u64,
                    permitted: permitted.max(0) as u64,
                })
                .collect(),
            time_series: time_series_rows
                .into_iter()
                .filter_map(|(bucket, total, blocked, permitted)| {
                    Some(TimeBucket {
                        bucket_start: DateTime::from_timestamp(bucket, 0)?.with_timezone(&Utc),
                        total: total.max(0) as u64,
                        blocked: blocked.max(0) as u64,
                        permitted: permitted.max(0) as u64,
                    })
                })
                .collect(),
        })
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>, batch_size: usize) -> Result<u64, AppError> {
        let result = sqlx::query(
            "DELETE FROM query_logs WHERE id IN (SELECT id FROM query_logs WHERE timestamp < ? LIMIT ?)",
        )
        .bind(cutoff.to_rfc3339())
        .bind(batch_size as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to sweep query log retention batch");
            AppError::Database(e.to_string())
        })?;

        Ok(result.rows_affected())
    }
}
