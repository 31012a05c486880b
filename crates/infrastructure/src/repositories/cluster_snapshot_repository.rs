use async_trait::async_trait;
use sentinel_application::ports::{ClusterSnapshot, ClusterSnapshotRepository, SnapshotClient, SnapshotRule};
use sentinel_application::AppError;
use sentinel_domain::settings::{is_cluster_private_key, SETTINGS_KEY_AUTH_ADMIN};
use sentinel_domain::{Blocklist, BlocklistMode, ClientProfile, Rule, RuleScope, RuleType};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, instrument};

use super::policy_data_repository::decode_profile;

const SNAPSHOT_VERSION: u32 = 1;

/// Leader export + follower apply of C5 state (spec §4.4 "Snapshot
/// export"/"Snapshot apply"). Reads use the read pool; `apply_snapshot`
/// runs on the write pool inside one transaction so a follower never
/// observes a half-applied snapshot.
pub struct SqliteClusterSnapshotRepository {
    read_pool: SqlitePool,
    write_pool: SqlitePool,
}

impl SqliteClusterSnapshotRepository {
    pub fn new(read_pool: SqlitePool, write_pool: SqlitePool) -> Self {
        Self { read_pool, write_pool }
    }
}

#[async_trait]
impl ClusterSnapshotRepository for SqliteClusterSnapshotRepository {
    #[instrument(skip(self))]
    async fn export_snapshot(&self) -> Result<ClusterSnapshot, AppError> {
        let settings_rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.read_pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let settings = settings_rows
            .into_iter()
            .filter(|(key, _)| !is_cluster_private_key(key))
            .filter_map(|(key, value)| serde_json::from_str(&value).ok().map(|v| (key, v)))
            .collect();

        let clients = self
            .client_profiles_raw()
            .await?
            .into_iter()
            .map(|p| SnapshotClient {
                id: p.id,
                profile_json: serde_json::to_value(ClientProfileView::from(&*p)).unwrap_or_default(),
            })
            .collect();

        let manual_rules = self
            .manual_rules_raw()
            .await?
            .into_iter()
            .map(|r| SnapshotRule {
                domain: r.domain.to_string(),
                rule_type: r.rule_type.as_str().to_string(),
                category: r.scope.encode(),
                created_at: r.created_at.unwrap_or_else(chrono::Utc::now),
            })
            .collect();

        let blocklist_rows: Vec<(
            i64,
            String,
            String,
            i64,
            String,
            Option<String>,
            Option<String>,
            Option<i64>,
            String,
            String,
        )> = sqlx::query_as(
            "SELECT id, name, url, enabled, mode, last_updated_at, last_error, last_rule_count, created_at, updated_at
             FROM blocklists",
        )
        .fetch_all(&self.read_pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let blocklists = blocklist_rows
            .into_iter()
            .filter_map(|(id, name, url, enabled, mode, last_updated_at, last_error, last_rule_count, created_at, updated_at)| {
                Some(Blocklist {
                    id: Some(id),
                    name: Arc::from(name.as_str()),
                    url: Arc::from(url.as_str()),
                    enabled: enabled != 0,
                    mode: BlocklistMode::from_str(&mode).ok()?,
                    last_updated_at: last_updated_at.and_then(|s| chrono::DateTime::parse_from_rfc3339(&s).ok()).map(|d| d.with_timezone(&chrono::Utc)),
                    last_error,
                    last_rule_count,
                    created_at: chrono::DateTime::parse_from_rfc3339(&created_at).ok().map(|d| d.with_timezone(&chrono::Utc)),
                    updated_at: chrono::DateTime::parse_from_rfc3339(&updated_at).ok().map(|d| d.with_timezone(&chrono::Utc)),
                })
            })
            .collect();

        Ok(ClusterSnapshot {
            version: SNAPSHOT_VERSION,
            settings,
            clients,
            manual_rules,
            blocklists,
        })
    }

    #[instrument(skip(self, snapshot))]
    async fn apply_snapshot(&self, snapshot: ClusterSnapshot) -> Result<(), AppError> {
        let mut tx = self.write_pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        for (key, value) in &snapshot.settings {
            // `auth_admin` sessions are local to each node; only overwrite it
            // when the incoming hash actually differs (spec §4.4 "preserving
            // ... iff the password hash is unchanged").
            if key == SETTINGS_KEY_AUTH_ADMIN {
                let existing: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
                    .bind(key)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                if let Some((existing_raw,)) = existing {
                    let existing_hash = serde_json::from_str::<serde_json::Value>(&existing_raw)
                        .ok()
                        .and_then(|v| v.get("passwordHash").cloned());
                    let incoming_hash = value.get("passwordHash").cloned();
                    if existing_hash == incoming_hash {
                        continue;
                    }
                }
            }

            let raw = serde_json::to_string(value).map_err(|e| AppError::Database(e.to_string()))?;
            sqlx::query(
                "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(raw)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        // Converge clients: delete-then-upsert (spec §3 "clients converge
        // (deletes honored)").
        sqlx::query("DELETE FROM clients")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        for client in &snapshot.clients {
            sqlx::query("INSERT INTO clients (id, profile) VALUES (?, ?)")
                .bind(client.id.to_string())
                .bind(client.profile_json.to_string())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        // Replace non-blocklist rules (manual + client/subnet scoped),
        // leaving `Blocklist:<id>` rows to the independent refresh cycle.
        sqlx::query("DELETE FROM rules WHERE category NOT LIKE 'Blocklist:%'")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        for rule in &snapshot.manual_rules {
            sqlx::query("INSERT OR IGNORE INTO rules (domain, type, category, created_at) VALUES (?, ?, ?, ?)")
                .bind(&rule.domain)
                .bind(&rule.rule_type)
                .bind(&rule.category)
                .bind(rule.created_at.to_rfc3339())
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        // Truncate-and-reinsert blocklists, preserving ids (spec §3).
        sqlx::query("DELETE FROM blocklists")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        for bl in &snapshot.blocklists {
            let Some(id) = bl.id else { continue };
            sqlx::query(
                "INSERT INTO blocklists (id, name, url, enabled, mode, last_updated_at, last_error, last_rule_count, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(id)
            .bind(bl.name.as_ref())
            .bind(bl.url.as_ref())
            .bind(bl.enabled as i64)
            .bind(bl.mode.as_str())
            .bind(bl.last_updated_at.map(|d| d.to_rfc3339()))
            .bind(&bl.last_error)
            .bind(bl.last_rule_count)
            .bind(bl.created_at.unwrap_or_else(chrono::Utc::now).to_rfc3339())
            .bind(bl.updated_at.unwrap_or_else(chrono::Utc::now).to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        // `blocklists.id` is AUTOINCREMENT; the preserved ids above can
        // leave `sqlite_sequence` behind the true max, letting a
        // locally-created blocklist collide with an id the leader still
        // owns (spec §3 "reset the id sequence to max(id)").
        sqlx::query(
            "INSERT INTO sqlite_sequence (name, seq)
             SELECT 'blocklists', COALESCE((SELECT MAX(id) FROM blocklists), 0)
             WHERE NOT EXISTS (SELECT 1 FROM sqlite_sequence WHERE name = 'blocklists')",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
        sqlx::query(
            "UPDATE sqlite_sequence SET seq = (SELECT COALESCE(MAX(id), 0) FROM blocklists) WHERE name = 'blocklists'",
        )
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn client_profiles_raw(&self) -> Result<Vec<Arc<ClientProfile>>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, profile FROM clients")
            .fetch_all(&self.read_pool)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load client profiles for snapshot");
                AppError::Database(e.to_string())
            })?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, profile)| {
                let id: i64 = id.parse().ok()?;
                decode_profile(id, &profile).map(Arc::new)
            })
            .collect())
    }

    async fn manual_rules_raw(&self) -> Result<Vec<Rule>, AppError> {
        let rows: Vec<(i64, String, String, String, String)> =
            sqlx::query_as("SELECT id, domain, type, category, created_at FROM rules WHERE category NOT LIKE 'Blocklist:%'")
                .fetch_all(&self.read_pool)
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
                    created_at: chrono::DateTime::parse_from_rfc3339(&created_at).ok().map(|d| d.with_timezone(&chrono::Utc)),
                })
            })
            .collect())
    }
}

/// Re-serializes a `ClientProfile` back into the JSON shape
/// `decode_profile` reads (spec §3 profile shape) as a string, ready for
/// the `clients.profile` column.
pub(crate) fn encode_profile(p: &ClientProfile) -> String {
    serde_json::to_string(&ClientProfileView::from(p)).unwrap_or_default()
}

/// Re-serializes a `ClientProfile` back into the same JSON shape
/// `decode_profile` reads (spec §3 profile shape), so export → apply
/// round-trips through the wire format unchanged.
#[derive(serde::Serialize)]
pub(crate) struct ClientProfileView {
    #[serde(rename = "type")]
    client_type: &'static str,
    ip: Option<String>,
    cidr: Option<String>,
    is_internet_paused: bool,
    use_global_settings: bool,
    use_global_categories: bool,
    use_global_apps: bool,
    assigned_blocklists: Vec<i64>,
    blocked_categories: Vec<String>,
    blocked_apps: Vec<String>,
    schedules: Vec<serde_json::Value>,
}

impl From<&ClientProfile> for ClientProfileView {
    fn from(p: &ClientProfile) -> Self {
        use sentinel_domain::ClientType;
        Self {
            client_type: match p.client_type {
                ClientType::Laptop => "laptop",
                ClientType::Smartphone => "smartphone",
                ClientType::Tv => "tv",
                ClientType::Game => "game",
                ClientType::Iot => "iot",
                ClientType::Tablet => "tablet",
                ClientType::Subnet => "subnet",
            },
            ip: p.ip.map(|ip| ip.to_string()),
            cidr: p.cidr.map(|c| c.to_string()),
            is_internet_paused: p.is_internet_paused,
            use_global_settings: p.use_global_settings,
            use_global_categories: p.use_global_categories,
            use_global_apps: p.use_global_apps,
            assigned_blocklists: p.assigned_blocklists.clone(),
            blocked_categories: p.blocked_categories.clone(),
            blocked_apps: p.blocked_apps.clone(),
            schedules: p
                .schedules
                .iter()
                .map(|s| {
                    serde_json::json!({
                        "id": s.id,
                        "days": s.days.iter().map(|d| d.to_string()).collect::<Vec<_>>(),
                        "start_minute": s.start_minute,
                        "end_minute": s.end_minute,
                        "active": s.active,
                        "mode": if s.mode == sentinel_domain::ScheduleMode::Sleep { "sleep" } else { "custom" },
                        "block_all": s.block_all,
                        "blocked_categories": s.blocked_categories,
                        "blocked_apps": s.blocked_apps,
                    })
                })
                .collect(),
        }
    }
}
