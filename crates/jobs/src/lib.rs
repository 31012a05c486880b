pub mod blocklist_sync;
pub mod follower_sync;
pub mod index_refresh;
pub mod query_log_retention;
pub mod runner;

pub use blocklist_sync::BlocklistSyncJob;
pub use follower_sync::FollowerSyncJob;
pub use index_refresh::IndexRefreshJob;
pub use query_log_retention::QueryLogRetentionJob;
pub use runner::JobRunner;
