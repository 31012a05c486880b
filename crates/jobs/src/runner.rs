use crate::{BlocklistSyncJob, FollowerSyncJob, IndexRefreshJob, QueryLogRetentionJob};
use std::sync::Arc;
use tracing::info;

/// Central orchestrator for all background jobs.
///
/// Use the builder pattern to register jobs, then call `.start()` once.
pub struct JobRunner {
    index_refresh: Option<IndexRefreshJob>,
    blocklist_sync: Option<BlocklistSyncJob>,
    query_log_retention: Option<QueryLogRetentionJob>,
    follower_sync: Option<FollowerSyncJob>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self {
            index_refresh: None,
            blocklist_sync: None,
            query_log_retention: None,
            follower_sync: None,
        }
    }

    pub fn with_index_refresh(mut self, job: IndexRefreshJob) -> Self {
        self.index_refresh = Some(job);
        self
    }

    pub fn with_blocklist_sync(mut self, job: BlocklistSyncJob) -> Self {
        self.blocklist_sync = Some(job);
        self
    }

    pub fn with_query_log_retention(mut self, job: QueryLogRetentionJob) -> Self {
        self.query_log_retention = Some(job);
        self
    }

    pub fn with_follower_sync(mut self, job: FollowerSyncJob) -> Self {
        self.follower_sync = Some(job);
        self
    }

    /// Start all registered background jobs.
    pub async fn start(self) {
        info!("Starting background job runner");

        if let Some(job) = self.index_refresh {
            Arc::new(job).start().await;
        }
        if let Some(job) = self.blocklist_sync {
            Arc::new(job).start().await;
        }
        if let Some(job) = self.query_log_retention {
            Arc::new(job).start().await;
        }
        if let Some(job) = self.follower_sync {
            Arc::new(job).start().await;
        }

        info!("All background jobs started");
    }
}

impl Default for JobRunner {
    fn default() -> Self {
        Self::new()
    }
}
