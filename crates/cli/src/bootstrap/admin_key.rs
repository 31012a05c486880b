use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

const ADMIN_TOKEN_FILE: &str = "admin_token";
const ADMIN_KEY_ENV: &str = "SENTINEL_API_KEY";

/// Resolves the bearer key `require_api_key` checks on every admin
/// request (spec §6 "Persistent state layout" — "generated admin
/// token"). `SENTINEL_API_KEY` wins when set; otherwise a key is
/// generated once and persisted next to the database so restarts don't
/// invalidate existing admin sessions.
pub fn load_or_create_admin_key(database_path: &str) -> anyhow::Result<Arc<str>> {
    if let Ok(key) = std::env::var(ADMIN_KEY_ENV) {
        if !key.is_empty() {
            info!("admin API key loaded from {ADMIN_KEY_ENV}");
            return Ok(key.into());
        }
    }

    let token_path = token_path(database_path);
    if let Ok(existing) = std::fs::read_to_string(&token_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            info!(path = %token_path.display(), "admin API key loaded from disk");
            return Ok(trimmed.into());
        }
    }

    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    let key = URL_SAFE_NO_PAD.encode(bytes);

    if let Some(parent) = token_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&token_path, &key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&token_path, std::fs::Permissions::from_mode(0o600))?;
    }

    warn!(path = %token_path.display(), "generated a new admin API key; it will not be shown again after this run");
    info!(admin_api_key = %key, "save this admin API key now");

    Ok(key.into())
}

fn token_path(database_path: &str) -> PathBuf {
    Path::new(database_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .join(ADMIN_TOKEN_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_path_sits_next_to_database_file() {
        assert_eq!(token_path("/data/sentinel.db"), PathBuf::from("/data/admin_token"));
        assert_eq!(token_path("sentinel.db"), PathBuf::from("./admin_token"));
    }
}
