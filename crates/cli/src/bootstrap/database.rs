use sentinel_domain::config::DatabaseConfig;
use sentinel_infrastructure::database::{create_query_log_pool, create_read_pool, create_write_pool};
use sqlx::SqlitePool;
use tracing::{error, info};

pub struct DatabasePools {
    pub write: SqlitePool,
    pub read: SqlitePool,
    pub query_log: SqlitePool,
}

pub async fn init_database(cfg: &DatabaseConfig) -> anyhow::Result<DatabasePools> {
    let database_url = format!("sqlite://{}", cfg.path);
    info!(path = %cfg.path, "initializing database");

    let write = create_write_pool(&database_url, cfg).await.map_err(|e| {
        error!(error = %e, "failed to initialize write pool");
        anyhow::anyhow!(e)
    })?;

    let query_log = create_query_log_pool(&database_url, cfg).await.map_err(|e| {
        error!(error = %e, "failed to initialize query log pool");
        anyhow::anyhow!(e)
    })?;

    let read = create_read_pool(&database_url, cfg).await.map_err(|e| {
        error!(error = %e, "failed to initialize read pool");
        anyhow::anyhow!(e)
    })?;

    info!(
        write_max = cfg.write_pool_max_connections,
        query_log_max = cfg.query_log_pool_max_connections,
        read_max = cfg.read_pool_max_connections,
        "database pools ready"
    );

    let warmup = read.clone();
    tokio::spawn(async move {
        warm_page_cache(&warmup).await;
    });

    Ok(DatabasePools { write, read, query_log })
}

async fn warm_page_cache(pool: &SqlitePool) {
    let result = sqlx::query("SELECT id FROM query_log ORDER BY id DESC LIMIT 5000").execute(pool).await;
    match result {
        Ok(r) => info!(rows = r.rows_affected(), "sqlite page cache warmed"),
        Err(e) => error!(error = %e, "sqlite warmup query failed (non-critical)"),
    }
}
