pub mod decide_query;
pub mod export_snapshot;
pub mod join_cluster;
pub mod refresh_blocklist;
pub mod refresh_index;
pub mod retention_sweep;
pub mod sync_follower;

pub use decide_query::{decide_query, Answer, QueryOutcome};
pub use export_snapshot::export_snapshot;
pub use join_cluster::accept_join_code;
pub use refresh_blocklist::refresh_blocklist;
pub use refresh_index::refresh_index;
pub use retention_sweep::retention_sweep;
pub use sync_follower::sync_once;
