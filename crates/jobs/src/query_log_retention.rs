use sentinel_application::ports::QueryLogRepository;
use sentinel_application::use_cases::retention_sweep;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Prunes query-log rows past `retention_days` (spec §4.6 "Retention").
/// A `retention_days` of 0 disables the job entirely: `start` never
/// spawns the ticker.
pub struct QueryLogRetentionJob {
    log: Arc<dyn QueryLogRepository>,
    retention_days: u32,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl QueryLogRetentionJob {
    pub fn new(log: Arc<dyn QueryLogRepository>, retention_days: u32) -> Self {
        Self {
            log,
            retention_days,
            interval_secs: 86400,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval_secs: u64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        if self.retention_days == 0 {
            info!("QueryLogRetentionJob: retention disabled (retention_days = 0), not starting");
            return;
        }

        info!(retention_days = self.retention_days, "Starting query log retention job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("QueryLogRetentionJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        match retention_sweep(self.log.as_ref(), self.retention_days, chrono::Utc::now()).await {
                            Ok(deleted) => info!(deleted, "query log retention sweep completed"),
                            Err(e) => error!(error = %e, "query log retention sweep failed"),
                        }
                    }
                }
            }
        });
    }
}
