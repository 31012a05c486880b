use sentinel_application::ports::{BlocklistFetcher, BlocklistRepository};
use sentinel_application::use_cases::refresh_blocklist;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Periodically refreshes every enabled blocklist (spec §4.3 "C3:
/// Blocklist refresh"). One tick walks the full set sequentially; a slow
/// or unreachable source only delays its own row's `lastError`, not the
/// others.
pub struct BlocklistSyncJob {
    repo: Arc<dyn BlocklistRepository>,
    fetcher: Arc<dyn BlocklistFetcher>,
    interval_secs: u64,
    shutdown: CancellationToken,
}

impl BlocklistSyncJob {
    pub fn new(repo: Arc<dyn BlocklistRepository>, fetcher: Arc<dyn BlocklistFetcher>) -> Self {
        Self {
            repo,
            fetcher,
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
        info!(interval_secs = self.interval_secs, "Starting blocklist sync job");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = self.shutdown.cancelled() => {
                        info!("BlocklistSyncJob: shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        self.refresh_all().await;
                    }
                }
            }
        });
    }

    async fn refresh_all(&self) {
        let blocklists = match self.repo.get_all().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(error = %e, "BlocklistSyncJob: failed to list blocklists");
                return;
            }
        };

        for row in blocklists.into_iter().filter(|b| b.enabled) {
            let id = match row.id {
                Some(id) => id,
                None => continue,
            };
            match refresh_blocklist(self.fetcher.as_ref(), self.repo.as_ref(), id, &row.url).await {
                Ok(count) => info!(blocklist_id = id, rules = count, "blocklist refreshed"),
                Err(e) => error!(blocklist_id = id, error = %e, "blocklist refresh failed"),
            }
        }
    }
}
