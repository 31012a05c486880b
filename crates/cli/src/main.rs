mod bootstrap;
mod di;
mod server;

use clap::Parser;
use di::container::Container;
use sentinel_domain::config::CliOverrides;
use sentinel_jobs::JobRunner;
use std::net::SocketAddr;
use tracing::{error, info};

/// Sentinel: DNS resolver, policy engine and HA control plane in a
/// single binary (spec §1 "Overview").
#[derive(Parser)]
#[command(name = "sentinel", version, about = "DNS resolver and policy engine")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short = 'c', long)]
    config: Option<String>,

    /// Overrides `server.dns_bind_address`.
    #[arg(long)]
    dns_bind: Option<String>,

    /// Overrides `server.admin_bind_address`.
    #[arg(long)]
    admin_bind: Option<String>,

    /// Overrides `database.path`.
    #[arg(long)]
    database_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        dns_bind_address: cli.dns_bind,
        admin_bind_address: cli.admin_bind,
        database_path: cli.database_path,
        config_file: cli.config.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!("sentinel starting up");

    let pools = bootstrap::init_database(&config.database).await?;
    let container = Container::build(&config, &pools).await?;
    let api_key = bootstrap::load_or_create_admin_key(&config.database.path)?;

    let (upstream, cache, listener_config) = container.build_upstream().await?;
    let dns_handler = container.build_dns_handler(upstream, cache.clone(), listener_config);
    let dns_bind_address = config.server.dns_bind_address.clone();

    tokio::spawn(async move {
        if let Err(e) = server::start_dns_server(dns_bind_address, dns_handler).await {
            error!(error = %e, "DNS listener exited");
        }
    });

    let follower_sync = container.build_follower_sync_job(&config).await?;
    let mut runner = JobRunner::new()
        .with_index_refresh(container.build_index_refresh_job())
        .with_blocklist_sync(container.build_blocklist_sync_job())
        .with_query_log_retention(container.build_query_log_retention_job(&config));
    if let Some(job) = follower_sync {
        info!("follower sync job enabled, node configured as cluster follower");
        runner = runner.with_follower_sync(job);
    }
    runner.start().await;

    let admin_bind_address: SocketAddr = config.server.admin_bind_address.parse()?;
    let app_state = container.build_app_state(api_key, cache, config.cluster.join_code_ttl_minutes);
    server::start_web_server(admin_bind_address, app_state, config.server.cors_allowed_origins.clone()).await?;

    Ok(())
}
