use async_trait::async_trait;
use sentinel_application::ports::BlocklistRepository;
use sentinel_application::AppError;
use sentinel_domain::{Blocklist, BlocklistMode};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, instrument};

pub struct SqliteBlocklistRepository {
    pool: SqlitePool,
}

impl SqliteBlocklistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_blocklist(row: BlocklistRowTuple) -> Option<Blocklist> {
        let (id, name, url, enabled, mode, last_updated_at, last_error, last_rule_count, created_at, updated_at) = row;
        Some(Blocklist {
            id: Some(id),
            name: Arc::from(name.as_str()),
            url: Arc::from(url.as_str()),
            enabled: enabled != 0,
            mode: BlocklistMode::from_str(&mode).ok()?,
            last_updated_at: last_updated_at.and_then(|s| parse_rfc3339(&s)),
            last_error,
            last_rule_count,
            created_at: parse_rfc3339(&created_at),
            updated_at: parse_rfc3339(&updated_at),
        })
    }
}

type BlocklistRowTuple = (
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
);

fn parse_rfc3339(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

const SELECT_COLS: &str =
    "id, name, url, enabled, mode, last_updated_at, last_error, last_rule_count, created_at, updated_at";

#[async_trait]
impl BlocklistRepository for SqliteBlocklistRepository {
    #[instrument(skip(self, blocklist))]
    async fn create(&self, blocklist: Blocklist) -> Result<Blocklist, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO blocklists (name, url, enabled, mode, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(blocklist.name.as_ref())
        .bind(blocklist.url.as_ref())
        .bind(blocklist.enabled as i64)
        .bind(blocklist.mode.as_str())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                AppError::BlocklistExists(blocklist.url.to_string())
            } else {
                error!(error = %e, "failed to insert blocklist");
                AppError::Database(e.to_string())
            }
        })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("failed to fetch created blocklist".to_string()))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> Result<Option<Blocklist>, AppError> {
        let row = sqlx::query_as::<_, BlocklistRowTuple>(&format!("SELECT {SELECT_COLS} FROM blocklists WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.and_then(Self::row_to_blocklist))
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Blocklist>, AppError> {
        let rows = sqlx::query_as::<_, BlocklistRowTuple>(&format!(
            "SELECT {SELECT_COLS} FROM blocklists ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().filter_map(Self::row_to_blocklist).collect())
    }

    #[instrument(skip(self, blocklist))]
    async fn update(&self, blocklist: Blocklist) -> Result<Blocklist, AppError> {
        let id = blocklist
            .id
            .ok_or_else(|| AppError::InvalidInput("blocklist id is required for update".to_string()))?;
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            "UPDATE blocklists SET name = ?, url = ?, enabled = ?, mode = ?, updated_at = ? WHERE id = ?",
        )
        .bind(blocklist.name.as_ref())
        .bind(blocklist.url.as_ref())
        .bind(blocklist.enabled as i64)
        .bind(blocklist.mode.as_str())
        .bind(&now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("blocklist {id}")));
        }
        self.get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("blocklist {id}")))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        sqlx::query("DELETE FROM rules WHERE category = ? OR category LIKE ?")
            .bind(format!("Blocklist:{id}"))
            .bind(format!("Blocklist:{id}:%"))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = sqlx::query("DELETE FROM blocklists WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("blocklist {id}")));
        }

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn url_exists(&self, url: &str) -> Result<bool, AppError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blocklists WHERE url = ?")
            .bind(url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(count.0 > 0)
    }

    #[instrument(skip(self, domains))]
    async fn replace_rules(&self, blocklist_id: i64, domains: &[String]) -> Result<usize, AppError> {
        let now = chrono::Utc::now().to_rfc3339();
        let category = format!("Blocklist:{blocklist_id}");

        let mut tx = self.pool.begin().await.map_err(|e| AppError::Database(e.to_string()))?;

        // Drop the current and any legacy `Blocklist:<id>:<name>` rows before
        // reinserting (spec §4.3 "Atomicity").
        sqlx::query("DELETE FROM rules WHERE category = ? OR category LIKE ?")
            .bind(&category)
            .bind(format!("Blocklist:{blocklist_id}:%"))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        for domain in domains {
            sqlx::query("INSERT OR IGNORE INTO rules (domain, type, category, created_at) VALUES (?, 'BLOCKED', ?, ?)")
                .bind(domain)
                .bind(&category)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        sqlx::query(
            "UPDATE blocklists SET last_updated_at = ?, last_rule_count = ?, last_error = NULL, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(domains.len() as i64)
        .bind(&now)
        .bind(blocklist_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        tx.commit().await.map_err(|e| AppError::Database(e.to_string()))?;
        Ok(domains.len())
    }

    #[instrument(skip(self))]
    async fn record_refresh_error(&self, blocklist_id: i64, message: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE blocklists SET last_error = ?, updated_at = ? WHERE id = ?")
            .bind(message)
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(blocklist_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
