use sentinel_domain::config::{CliOverrides, Config};
use tracing::info;

pub fn load_config(config_path: Option<&str>, cli_overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(config_path, cli_overrides)?;
    config.validate()?;

    info!(
        config_file = config_path.unwrap_or("default"),
        dns_bind = %config.server.dns_bind_address,
        admin_bind = %config.server.admin_bind_address,
        database = %config.database.path,
        "configuration loaded"
    );

    Ok(config)
}
