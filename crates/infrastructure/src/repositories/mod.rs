pub mod admin_repository;
pub mod blocklist_repository;
pub mod cluster_snapshot_repository;
pub mod policy_data_repository;
pub mod query_log_repository;

pub use admin_repository::SqliteAdminRepository;
pub use blocklist_repository::SqliteBlocklistRepository;
pub use cluster_snapshot_repository::SqliteClusterSnapshotRepository;
pub use policy_data_repository::SqlitePolicyDataRepository;
pub use query_log_repository::SqliteQueryLogRepository;
