use sentinel_application::policy::PolicyEngine;
use sentinel_application::ports::PolicyDataPort;
use sentinel_application::use_cases::refresh_index;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Ticks `refresh_index` on the coalescing cadence spec §4.2 describes
/// (~5 s): every admin mutation marks the index dirty, this job is what
/// actually rebuilds and publishes it.
pub struct IndexRefreshJob {
    data: Arc<dyn PolicyDataPort>,
    engine: Arc<PolicyEngine>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl IndexRefreshJob {
    pub fn new(data: Arc<dyn PolicyDataPort>, engine: Arc<PolicyEngine>) -> Self {
        Self {
            data,
            engine,
            interval_secs: 5,
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
        info!(interval_secs = self.interval_secs, "Starting policy index refresh job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("IndexRefreshJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = refresh_index(self.data.as_ref(), &self.engine).await {
                            error!(error = %e, "Index refresh failed");
                        }
                    }
                }
            }
        });
    }
}
