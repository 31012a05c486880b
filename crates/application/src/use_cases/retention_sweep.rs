use crate::errors::AppError;
use crate::ports::QueryLogRepository;
use chrono::{DateTime, Utc};

const BATCH_SIZE: usize = 10_000;

/// Delete query-log rows older than `retention_days` in bounded batches
/// (spec §4.6 "Retention"). Returns the total number of rows removed.
/// Callers (the jobs crate) skip invoking this entirely when
/// `retention_days == 0` or running in a test environment.
pub async fn retention_sweep(log: &dyn QueryLogRepository, retention_days: u32, now: DateTime<Utc>) -> Result<u64, AppError> {
    let cutoff = now - chrono::Duration::days(retention_days as i64);
    let mut total = 0u64;
    loop {
        let deleted = log.delete_older_than(cutoff, BATCH_SIZE).await?;
        total += deleted;
        if deleted == 0 || (deleted as usize) < BATCH_SIZE {
            break;
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::LogAggregates;
    use async_trait::async_trait;
    use sentinel_domain::QueryLogEntry;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FakeLog {
        remaining: AtomicU64,
    }

    #[async_trait]
    impl QueryLogRepository for FakeLog {
        async fn append(&self, _entry: QueryLogEntry) -> Result<(), AppError> {
            Ok(())
        }
        async fn append_batch(&self, _entries: Vec<QueryLogEntry>) -> Result<(), AppError> {
            Ok(())
        }
        async fn query(
            &self,
            _since: DateTime<Utc>,
            _domain: Option<&str>,
            _status: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<QueryLogEntry>, AppError> {
            Ok(Vec::new())
        }
        async fn aggregates(&self, _since: DateTime<Utc>, _exclude_hostnames: &[String]) -> Result<LogAggregates, AppError> {
            Ok(LogAggregates::default())
        }
        async fn delete_older_than(&self, _cutoff: DateTime<Utc>, batch_size: usize) -> Result<u64, AppError> {
            let remaining = self.remaining.load(Ordering::SeqCst);
            let take = remaining.min(batch_size as u64);
            self.remaining.fetch_sub(take, Ordering::SeqCst);
            Ok(take)
        }
    }

    #[tokio::test]
    async fn sweeps_in_batches_until_dry() {
        let log = FakeLog {
            remaining: AtomicU64::new(25_000),
        };
        let total = retention_sweep(&log, 30, Utc::now()).await.unwrap();
        assert_eq!(total, 25_000);
    }

    #[tokio::test]
    async fn no_rows_returns_zero() {
        let log = FakeLog {
            remaining: AtomicU64::new(0),
        };
        let total = retention_sweep(&log, 30, Utc::now()).await.unwrap();
        assert_eq!(total, 0);
    }
}
