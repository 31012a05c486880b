use serde::{Deserialize, Serialize};

/// Listener bind addresses (spec §0, teacher's `ServerConfig`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_dns_bind")]
    pub dns_bind_address: String,

    #[serde(default = "default_admin_bind")]
    pub admin_bind_address: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,
}

fn default_dns_bind() -> String {
    "0.0.0.0:53".to_string()
}

fn default_admin_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dns_bind_address: default_dns_bind(),
            admin_bind_address: default_admin_bind(),
            cors_allowed_origins: default_cors_origins(),
        }
    }
}
