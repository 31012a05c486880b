use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentinel_application::errors::AppError;
use sentinel_application::ports::{LogAggregates, QueryLogRepository};
use sentinel_domain::QueryLogEntry;
use sentinel_jobs::QueryLogRetentionJob;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct CountingLog {
    remaining: AtomicU64,
    calls: AtomicU64,
}

#[async_trait]
impl QueryLogRepository for CountingLog {
    async fn append(&self, _entry: QueryLogEntry) -> Result<(), AppError> {
        Ok(())
    }
    async fn append_batch(&self, _entries: Vec<QueryLogEntry>) -> Result<(), AppError> {
        Ok(())
    }
    async fn query(&self, _since: DateTime<Utc>, _domain: Option<&str>, _status: Option<&str>, _limit: usize) -> Result<Vec<QueryLogEntry>, AppError> {
        Ok(Vec::new())
    }
    async fn aggregates(&self, _since: DateTime<Utc>, _exclude_hostnames: &[String]) -> Result<LogAggregates, AppError> {
        Ok(LogAggregates::default())
    }
    async fn delete_older_than(&self, _cutoff: DateTime<Utc>, batch_size: usize) -> Result<u64, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.remaining.load(Ordering::SeqCst);
        let deleted = remaining.min(batch_size as u64);
        self.remaining.fetch_sub(deleted, Ordering::SeqCst);
        Ok(deleted)
    }
}

#[tokio::test]
async fn zero_retention_days_never_starts_the_ticker() {
    let log: Arc<dyn QueryLogRepository> = Arc::new(CountingLog::default());
    let job = Arc::new(QueryLogRetentionJob::new(log, 0));
    // start() returns immediately without spawning when retention is disabled.
    job.start().await;
}

#[tokio::test]
async fn ticks_trigger_retention_sweeps() {
    let backing = Arc::new(CountingLog {
        remaining: AtomicU64::new(5),
        calls: AtomicU64::new(0),
    });
    let log: Arc<dyn QueryLogRepository> = backing.clone();
    let token = CancellationToken::new();

    let job = Arc::new(
        QueryLogRetentionJob::new(log, 30)
            .with_interval(1)
            .with_cancellation(token.clone()),
    );
    job.start().await;

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;
    token.cancel();

    assert!(backing.calls.load(Ordering::SeqCst) >= 1);
}
