use crate::errors::AppError;
use async_trait::async_trait;
use sentinel_domain::Blocklist;

/// CRUD + refresh bookkeeping for `Blocklist` entities (spec §3, §4.3).
#[async_trait]
pub trait BlocklistRepository: Send + Sync {
    async fn create(&self, blocklist: Blocklist) -> Result<Blocklist, AppError>;
    async fn get_by_id(&self, id: i64) -> Result<Option<Blocklist>, AppError>;
    async fn get_all(&self) -> Result<Vec<Blocklist>, AppError>;
    async fn update(&self, blocklist: Blocklist) -> Result<Blocklist, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn url_exists(&self, url: &str) -> Result<bool, AppError>;

    /// Atomically replace every rule under `Blocklist:<id>` (and any
    /// legacy `Blocklist:<id>:%` rows) with `domains`, then stamp
    /// `lastUpdatedAt`/`lastRuleCount` (spec §4.3 "Atomicity"). Returns
    /// the number of rows inserted.
    async fn replace_rules(&self, blocklist_id: i64, domains: &[String]) -> Result<usize, AppError>;

    /// Record a failed refresh outside the replace transaction (spec
    /// §4.3 "On error: rollback; record lastError = msg").
    async fn record_refresh_error(&self, blocklist_id: i64, message: &str) -> Result<(), AppError>;
}
