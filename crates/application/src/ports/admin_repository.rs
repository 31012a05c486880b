use crate::errors::AppError;
use async_trait::async_trait;
use sentinel_domain::{ClientProfile, DnsForwardSettings, DnsRewrite, ProtectionPause, Rule};
use std::sync::Arc;

/// CRUD for manually-entered rules (spec §6 `GET/POST /api/rules`,
/// `DELETE /api/rules/:id`). Blocklist-owned rows are never written
/// through here; they're owned exclusively by `refresh_blocklist`.
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Rule>, AppError>;
    async fn create(&self, rule: Rule) -> Result<Rule, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

/// CRUD for client/subnet profiles (spec §6 `GET/PUT/DELETE
/// /api/clients[/:id]`).
#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Arc<ClientProfile>>, AppError>;
    async fn get(&self, id: i64) -> Result<Option<Arc<ClientProfile>>, AppError>;
    async fn upsert(&self, profile: ClientProfile) -> Result<ClientProfile, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

/// CRUD for DNS rewrites, stored as the `dns_rewrites` settings record
/// (spec §3 "DNS rewrite ... stored as a single JSON settings record",
/// spec §6 `GET/POST/PUT/DELETE /api/dns/rewrites[/:id]`).
#[async_trait]
pub trait RewriteRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<DnsRewrite>, AppError>;
    async fn upsert(&self, rewrite: DnsRewrite) -> Result<DnsRewrite, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

/// The settings singletons (spec §6 `GET/PUT /api/dns/settings`, `GET/PUT
/// /api/protection/pause`, `GET /api/settings`, `PUT /api/settings/:key`).
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_dns_settings(&self) -> Result<DnsForwardSettings, AppError>;
    async fn put_dns_settings(&self, settings: DnsForwardSettings) -> Result<(), AppError>;

    async fn get_protection_pause(&self) -> Result<ProtectionPause, AppError>;
    async fn put_protection_pause(&self, pause: ProtectionPause) -> Result<(), AppError>;

    /// The generic `settings` table as raw JSON values, for admin keys
    /// that have no dedicated typed accessor (spec's `Opaque` variant).
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, AppError>;
    async fn put_raw(&self, key: &str, value: serde_json::Value) -> Result<(), AppError>;
    async fn list_raw(&self) -> Result<Vec<(String, serde_json::Value)>, AppError>;
}
