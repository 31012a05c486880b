pub mod admin_repository;
pub mod blocklist_fetcher;
pub mod blocklist_repository;
pub mod cluster_snapshot_repository;
pub mod cluster_transport;
pub mod policy_data;
pub mod query_log_repository;
pub mod response_cache;
pub mod role_override;
pub mod secret_store;
pub mod upstream_resolver;

pub use admin_repository::{ClientRepository, RewriteRepository, RuleRepository, SettingsRepository};
pub use blocklist_fetcher::BlocklistFetcher;
pub use blocklist_repository::BlocklistRepository;
pub use cluster_snapshot_repository::{ClusterSnapshot, ClusterSnapshotRepository, SnapshotClient, SnapshotRule, SyncOutcome};
pub use cluster_transport::ClusterTransport;
pub use policy_data::{BlocklistRow, PolicyDataPort};
pub use query_log_repository::{ClientAggregate, LogAggregates, QueryLogRepository, TimeBucket};
pub use response_cache::{CacheStatsSnapshot, CachedAnswer, ResponseCachePort};
pub use role_override::RoleOverrideReader;
pub use secret_store::SecretStore;
pub use upstream_resolver::{UpstreamAnswer, UpstreamResolver};
