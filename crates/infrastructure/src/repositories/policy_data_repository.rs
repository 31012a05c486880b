use async_trait::async_trait;
use sentinel_application::ports::{BlocklistRow, PolicyDataPort};
use sentinel_application::AppError;
use sentinel_domain::{
    BlocklistMode, ClientProfile, ClientType, DnsRewrite, ProtectionPause, Rule, RuleScope, RuleType,
};
use sqlx::SqlitePool;
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, instrument};

/// Loads the flat snapshot an `Index` rebuild needs (spec §4.2 "Indexed
/// state", §4.5 "Persistence adapter"). Reads go through the dedicated
/// read pool, never the write pool, so a refresh cycle never contends
/// with admin CRUD.
pub struct SqlitePolicyDataRepository {
    pool: SqlitePool,
}

impl SqlitePolicyDataRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ScheduleDto {
    id: Option<i64>,
    days: Vec<String>,
    start_minute: u16,
    end_minute: u16,
    active: bool,
    mode: String,
    block_all: Option<bool>,
    blocked_categories: Vec<String>,
    blocked_apps: Vec<String>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct ClientProfileDto {
    #[serde(rename = "type")]
    client_type: String,
    ip: Option<String>,
    cidr: Option<String>,
    is_internet_paused: bool,
    use_global_settings: bool,
    use_global_categories: bool,
    use_global_apps: bool,
    assigned_blocklists: Vec<i64>,
    blocked_categories: Vec<String>,
    blocked_apps: Vec<String>,
    schedules: Vec<ScheduleDto>,
}

fn weekday_from_str(s: &str) -> Option<chrono::Weekday> {
    use chrono::Weekday::*;
    match s {
        "Mon" => Some(Mon),
        "Tue" => Some(Tue),
        "Wed" => Some(Wed),
        "Thu" => Some(Thu),
        "Fri" => Some(Fri),
        "Sat" => Some(Sat),
        "Sun" => Some(Sun),
        _ => None,
    }
}

/// Decode one `clients.profile` JSON blob into a domain `ClientProfile`.
/// Malformed rows are skipped with a logged warning rather than failing
/// the whole refresh cycle (spec §4.2 is silent on this; a single
/// corrupt profile must not take down policy evaluation for everyone
/// else — see DESIGN.md).
pub(crate) fn decode_profile(id: i64, raw: &str) -> Option<ClientProfile> {
    let dto: ClientProfileDto = match serde_json::from_str(raw) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(client_id = id, error = %e, "skipping client with malformed profile");
            return None;
        }
    };

    let client_type = match dto.client_type.as_str() {
        "laptop" => ClientType::Laptop,
        "smartphone" => ClientType::Smartphone,
        "tv" => ClientType::Tv,
        "game" => ClientType::Game,
        "iot" => ClientType::Iot,
        "tablet" => ClientType::Tablet,
        "subnet" => ClientType::Subnet,
        other => {
            tracing::warn!(client_id = id, client_type = other, "unknown client type, skipping");
            return None;
        }
    };

    let ip = dto.ip.as_deref().and_then(|s| IpAddr::from_str(s).ok());
    let cidr = dto.cidr.as_deref().and_then(|s| ipnetwork::IpNetwork::from_str(s).ok());

    let schedules = dto
        .schedules
        .into_iter()
        .map(|s| sentinel_domain::Schedule {
            id: s.id,
            days: s.days.iter().filter_map(|d| weekday_from_str(d)).collect(),
            start_minute: s.start_minute,
            end_minute: s.end_minute,
            active: s.active,
            mode: if s.mode == "sleep" {
                sentinel_domain::ScheduleMode::Sleep
            } else {
                sentinel_domain::ScheduleMode::Custom
            },
            block_all: s.block_all,
            blocked_categories: s.blocked_categories,
            blocked_apps: s.blocked_apps,
        })
        .collect();

    Some(ClientProfile {
        id,
        client_type,
        ip,
        cidr,
        is_internet_paused: dto.is_internet_paused,
        use_global_settings: dto.use_global_settings,
        use_global_categories: dto.use_global_categories,
        use_global_apps: dto.use_global_apps,
        assigned_blocklists: dto.assigned_blocklists,
        blocked_categories: dto.blocked_categories,
        blocked_apps: dto.blocked_apps,
        schedules,
    })
}

#[async_trait]
impl PolicyDataPort for SqlitePolicyDataRepository {
    #[instrument(skip(self))]
    async fn load_rules(&self) -> Result<Vec<Rule>, AppError> {
        let rows: Vec<(i64, String, String, String, String)> =
            sqlx::query_as("SELECT id, domain, type, category, created_at FROM rules")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to load rules");
                    AppError::Database(e.to_string())
                })?;

        let mut rules = Vec::with_capacity(rows.len());
        for (id, domain, rule_type, category, created_at) in rows {
            let rule_type = match RuleType::from_str(&rule_type) {
                Ok(t) => t,
                Err(_) => continue,
            };
            let scope = match RuleScope::decode(&category) {
                Ok(s) => s,
                Err(_) => continue,
            };
            rules.push(Rule {
                id: Some(id),
                domain: Arc::from(domain.as_str()),
                rule_type,
                scope,
                created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                    .ok()
                    .map(|dt| dt.with_timezone(&chrono::Utc)),
            });
        }
        Ok(rules)
    }

    #[instrument(skip(self))]
    async fn load_clients(&self) -> Result<Vec<Arc<ClientProfile>>, AppError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT id, profile FROM clients")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!(error = %e, "failed to load clients");
                AppError::Database(e.to_string())
            })?;

        let profiles = rows
            .into_iter()
            .filter_map(|(id, profile)| {
                let id: i64 = id.parse().ok()?;
                decode_profile(id, &profile).map(Arc::new)
            })
            .collect();
        Ok(profiles)
    }

    #[instrument(skip(self))]
    async fn load_blocklists(&self) -> Result<Vec<BlocklistRow>, AppError> {
        let rows: Vec<(i64, i64, String, String)> =
            sqlx::query_as("SELECT id, enabled, mode, name FROM blocklists")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    error!(error = %e, "failed to load blocklists");
                    AppError::Database(e.to_string())
                })?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, enabled, mode, name)| {
                Some(BlocklistRow {
                    id,
                    enabled: enabled != 0,
                    mode: BlocklistMode::from_str(&mode).ok()?,
                    name: Arc::from(name.as_str()),
                })
            })
            .collect())
    }

    #[instrument(skip(self))]
    async fn load_rewrites(&self) -> Result<Vec<DnsRewrite>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = 'dns_rewrites'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some((raw,)) = row else {
            return Ok(Vec::new());
        };

        let records: Vec<sentinel_domain::settings::RewriteRecord> = serde_json::from_str(&raw).unwrap_or_default();
        Ok(records
            .into_iter()
            .filter_map(|r| DnsRewrite::new(&r.domain, &r.target).ok())
            .collect())
    }

    #[instrument(skip(self))]
    async fn load_protection_pause(&self) -> Result<ProtectionPause, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = 'protection_pause'")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row
            .and_then(|(raw,)| serde_json::from_str(&raw).ok())
            .unwrap_or_default())
    }
}
