use sentinel_domain::config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn init_logging(config: &Config) {
    let filter = EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt().with_target(true).with_thread_ids(false).with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_target(true).with_thread_ids(false).with_env_filter(filter).init();
    }

    info!(level = %config.logging.level, json = config.logging.json, "logging initialized");
}
