use async_trait::async_trait;
use sentinel_application::ports::{ClientRepository, RewriteRepository, RuleRepository, SettingsRepository};
use sentinel_application::AppError;
use sentinel_domain::settings::{RewriteRecord, SETTINGS_KEY_DNS, SETTINGS_KEY_DNS_REWRITES, SETTINGS_KEY_PROTECTION_PAUSE};
use sentinel_domain::{ClientProfile, DnsForwardSettings, DnsRewrite, ProtectionPause, Rule, RuleScope, RuleType};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, instrument};

use super::cluster_snapshot_repository::encode_profile;
use super::policy_data_repository::decode_profile;

fn parse_rfc3339(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&chrono::Utc))
}

/// Admin CRUD for rules, clients, rewrites and settings (spec §6), the
/// write side `PolicyDataPort` never needed.
pub struct SqliteAdminRepository {
    pool: SqlitePool,
}

impl SqliteAdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for SqliteAdminRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Rule>, AppError> {
        let rows: Vec<(i64, String, String, String, String)> =
            sqlx::query_as("SELECT id, domain, type, category, created_at FROM rules WHERE category NOT LIKE 'Blocklist:%' ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, domain, rule_type, category, created_at)| {
                Some(Rule {
                    id: Some(id),
                    domain: Arc::from(domain.as_str()),
                    rule_type: RuleType::from_str(&rule_type).ok()?,
                    scope: RuleScope::decode(&category).ok()?,
                    created_at: parse_rfc3339(&created_at),
                })
            })
            .collect())
    }

    #[instrument(skip(self, rule))]
    async fn create(&self, rule: Rule) -> Result<Rule, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let category = rule.scope.encode();
        let result = sqlx::query("INSERT INTO rules (domain, type, category, created_at) VALUES (?, ?, ?, ?)")
            .bind(rule.domain.as_ref())
            .bind(rule.rule_type.as_str())
            .bind(&category)
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if e.to_string().contains("UNIQUE constraint failed") {
                    AppError::AlreadyConfigured(format!("rule {} already exists for {}", rule.domain, category))
                } else {
                    error!(error = %e, "failed to insert rule");
                    AppError::Database(e.to_string())
                }
            })?;

        Ok(Rule {
            id: Some(result.last_insert_rowid()),
            created_at: parse_rfc3339(&now),
            ..rule
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM rules WHERE id = ? AND category NOT LIKE 'Blocklist:%'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("rule {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for SqliteAdminRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Arc<ClientProfile>>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, profile FROM clients")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, profile)| {
                let id: i64 = id.parse().ok()?;
                decode_profile(id, &profile).map(Arc::new)
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Option<Arc<ClientProfile>>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT profile FROM clients WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.and_then(|(raw,)| decode_profile(id, &raw)).map(Arc::new))
    }

    #[instrument(skip(self, profile))]
    async fn upsert(&self, profile: ClientProfile) -> Result<ClientProfile, AppError> {
        let encoded = encode_profile(&profile);
        sqlx::query(
            "INSERT INTO clients (id, profile) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET profile = excluded.profile",
        )
        .bind(profile.id.to_string())
        .bind(encoded)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, "failed to upsert client profile");
            AppError::Database(e.to_string())
        })?;
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM clients WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM rules WHERE category = ? OR category = ?")
            .bind(format!("Client:{id}"))
            .bind(format!("Subnet:{id}"))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl RewriteRepository for SqliteAdminRepository {
    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<DnsRewrite>, AppError> {
        Ok(self
            .read_rewrite_records()
            .await?
            .into_iter()
            .filter_map(|r| DnsRewrite::new(&r.domain, &r.target).ok())
            .collect())
    }

    #[instrument(skip(self, rewrite))]
    async fn upsert(&self, rewrite: DnsRewrite) -> Result<DnsRewrite, AppError> {
        let mut records = self.read_rewrite_records().await?;
        let next_id = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;

        match rewrite.id {
            Some(id) => {
                let Some(existing) = records.iter_mut().find(|r| r.id == Some(id)) else {
                    return Err(AppError::NotFound(format!("rewrite {id}")));
                };
                existing.domain = rewrite.domain.to_string();
                existing.target = rewrite.target.to_storage_string();
            }
            None => {
                records.push(RewriteRecord {
                    id: Some(next_id),
                    domain: rewrite.domain.to_string(),
                    target: rewrite.target.to_storage_string(),
                });
            }
        }

        self.write_rewrite_records(&records).await?;
        let stored_id = rewrite.id.unwrap_or(next_id);
        Ok(DnsRewrite {
            id: Some(stored_id),
            ..rewrite
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut records = self.read_rewrite_records().await?;
        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            return Err(AppError::NotFound(format!("rewrite {id}")));
        }
        self.write_rewrite_records(&records).await
    }
}

impl SqliteAdminRepository {
    async fn read_rewrite_records(&self) -> Result<Vec<RewriteRecord>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(SETTINGS_KEY_DNS_REWRITES)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row
            .map(|(raw,)| serde_json::from_str(&raw).unwrap_or_default())
            .unwrap_or_default())
    }

    async fn write_rewrite_records(&self, records: &[RewriteRecord]) -> Result<(), AppError> {
        let raw = serde_json::to_string(records).map_err(|e| AppError::Database(e.to_string()))?;
        self.put_raw_value(SETTINGS_KEY_DNS_REWRITES, &raw).await
    }

    async fn put_raw_value(&self, key: &str, raw: &str) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(raw)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsRepository for SqliteAdminRepository {
    #[instrument(skip(self))]
    async fn get_dns_settings(&self) -> Result<DnsForwardSettings, AppError> {
        match self.get_raw(SETTINGS_KEY_DNS).await? {
            Some(v) => serde_json::from_value(v).map_err(|e| AppError::Database(e.to_string())),
            None => Ok(DnsForwardSettings::default()),
        }
    }

    #[instrument(skip(self, settings))]
    async fn put_dns_settings(&self, settings: DnsForwardSettings) -> Result<(), AppError> {
        let value = serde_json::to_value(&settings).map_err(|e| AppError::Database(e.to_string()))?;
        self.put_raw(SETTINGS_KEY_DNS, value).await
    }

    #[instrument(skip(self))]
    async fn get_protection_pause(&self) -> Result<ProtectionPause, AppError> {
        match self.get_raw(SETTINGS_KEY_PROTECTION_PAUSE).await? {
            Some(v) => serde_json::from_value(v).map_err(|e| AppError::Database(e.to_string())),
            None => Ok(ProtectionPause::default()),
        }
    }

    #[instrument(skip(self, pause))]
    async fn put_protection_pause(&self, pause: ProtectionPause) -> Result<(), AppError> {
        let value = serde_json::to_value(&pause).map_err(|e| AppError::Database(e.to_string()))?;
        self.put_raw(SETTINGS_KEY_PROTECTION_PAUSE, value).await
    }

    #[instrument(skip(self))]
    async fn get_raw(&self, key: &str) -> Result<Option<serde_json::Value>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.and_then(|(raw,)| serde_json::from_str(&raw).ok()))
    }

    #[instrument(skip(self, value))]
    async fn put_raw(&self, key: &str, value: serde_json::Value) -> Result<(), AppError> {
        let raw = serde_json::to_string(&value).map_err(|e| AppError::Database(e.to_string()))?;
        self.put_raw_value(key, &raw).await
    }

    #[instrument(skip(self))]
    async fn list_raw(&self) -> Result<Vec<(String, serde_json::Value)>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|(key, raw)| serde_json::from_str(&raw).ok().map(|v| (key, v)))
            .collect())
    }
}
