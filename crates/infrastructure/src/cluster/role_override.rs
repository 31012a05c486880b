use sentinel_application::ports::RoleOverrideReader;
use sentinel_domain::ClusterRole;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::warn;

const OVERRIDE_TTL: Duration = Duration::from_secs(5);

struct Cached {
    value: Option<ClusterRole>,
    read_at: Instant,
}

/// Re-reads the HA role-override path with a short TTL (spec §9 redesign
/// note, §4.4 "Roles"). Written externally by a VRRP daemon; this side
/// only ever reads it.
pub struct FileRoleOverrideReader {
    path: PathBuf,
    cache: Mutex<Option<Cached>>,
}

impl FileRoleOverrideReader {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: Mutex::new(None),
        }
    }

    fn read_fresh(&self) -> Option<ClusterRole> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match ClusterRole::from_str(raw.trim()) {
            Ok(role) => Some(role),
            Err(_) => {
                warn!(path = %self.path.display(), "role override file contains an unparseable role, ignoring");
                None
            }
        }
    }
}

impl RoleOverrideReader for FileRoleOverrideReader {
    fn read(&self) -> Option<ClusterRole> {
        let mut cache = self.cache.lock().expect("role override cache mutex is never poisoned");
        if let Some(cached) = cache.as_ref() {
            if cached.read_at.elapsed() < OVERRIDE_TTL {
                return cached.value;
            }
        }
        let value = self.read_fresh();
        *cache = Some(Cached {
            value,
            read_at: Instant::now(),
        });
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_none() {
        let reader = FileRoleOverrideReader::new(PathBuf::from("/nonexistent/role-override"));
        assert_eq!(reader.read(), None);
    }

    #[test]
    fn valid_role_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("role-override");
        std::fs::write(&path, "leader\n").unwrap();
        let reader = FileRoleOverrideReader::new(path);
        assert_eq!(reader.read(), Some(ClusterRole::Leader));
    }

    #[test]
    fn cache_serves_stale_value_within_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("role-override");
        std::fs::write(&path, "follower\n").unwrap();
        let reader = FileRoleOverrideReader::new(path.clone());
        assert_eq!(reader.read(), Some(ClusterRole::Follower));

        std::fs::write(&path, "leader\n").unwrap();
        assert_eq!(reader.read(), Some(ClusterRole::Follower));
    }
}
