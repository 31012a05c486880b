use crate::errors::AppError;
use async_trait::async_trait;
use sentinel_domain::{ClientProfile, DnsRewrite, ProtectionPause, Rule};
use std::sync::Arc;

/// Enabled/mode/name for one blocklist, as loaded for an `Index` rebuild.
#[derive(Debug, Clone)]
pub struct BlocklistRow {
    pub id: i64,
    pub enabled: bool,
    pub mode: sentinel_domain::BlocklistMode,
    pub name: Arc<str>,
}

/// Everything `IndexBuilder` needs for one refresh cycle (spec §4.2
/// "Indexed state"), loaded as a flat snapshot so the builder never talks
/// to the database itself.
#[async_trait]
pub trait PolicyDataPort: Send + Sync {
    async fn load_rules(&self) -> Result<Vec<Rule>, AppError>;
    async fn load_clients(&self) -> Result<Vec<Arc<ClientProfile>>, AppError>;
    async fn load_blocklists(&self) -> Result<Vec<BlocklistRow>, AppError>;
    async fn load_rewrites(&self) -> Result<Vec<DnsRewrite>, AppError>;
    async fn load_protection_pause(&self) -> Result<ProtectionPause, AppError>;
}
