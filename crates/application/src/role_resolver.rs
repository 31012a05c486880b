use chrono::{DateTime, Utc};
use sentinel_domain::ClusterRole;

const READY_STALENESS: chrono::Duration = chrono::Duration::seconds(20);

/// Paths exempt from the follower read-only guard (spec §4.4 "Read-only
/// guard" allowlist).
const READONLY_GUARD_ALLOWLIST_PREFIXES: &[&str] = &[
    "/api/cluster/",
    "/api/health",
    "/api/auth/login",
    "/api/auth/logout",
    "/api/auth/change-password",
    "/api/query-logs/",
    "/api/suspicious/ignored",
    "/api/notifications/feed/mark-read",
    "/api/maintenance/query-logs/",
    "/api/maintenance/notifications/clear",
    "/api/maintenance/ignored-anomalies/clear",
];

/// `GET /api/cluster/ready` logic (spec §4.4 "Readiness"). `stored` is the
/// configured role, `effective` the role after filesystem override,
/// `last_sync` the follower loop's most recent successful sync, if any.
pub fn is_ready(stored: ClusterRole, effective: ClusterRole, last_sync: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    match stored {
        ClusterRole::Standalone | ClusterRole::Leader => true,
        ClusterRole::Follower => match effective {
            ClusterRole::Leader => true, // VIP owner; sync is not expected.
            _ => last_sync.is_some_and(|t| now - t < READY_STALENESS),
        },
    }
}

/// Whether a mutating `/api/*` request must be rejected with
/// `FOLLOWER_READONLY` (spec §4.4 "Read-only guard"). Keyed on the
/// *stored* role, never the effective one — "configured follower is
/// always read-only" (spec §3).
pub fn rejects_as_readonly(stored: ClusterRole, cluster_enabled: bool, path: &str) -> bool {
    if !cluster_enabled || stored != ClusterRole::Follower {
        return false;
    }
    !READONLY_GUARD_ALLOWLIST_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standalone_and_leader_always_ready() {
        let now = Utc::now();
        assert!(is_ready(ClusterRole::Standalone, ClusterRole::Standalone, None, now));
        assert!(is_ready(ClusterRole::Leader, ClusterRole::Leader, None, now));
    }

    #[test]
    fn follower_ready_only_when_recently_synced() {
        let now = Utc::now();
        assert!(!is_ready(ClusterRole::Follower, ClusterRole::Follower, None, now));
        assert!(is_ready(
            ClusterRole::Follower,
            ClusterRole::Follower,
            Some(now - chrono::Duration::seconds(5)),
            now
        ));
        assert!(!is_ready(
            ClusterRole::Follower,
            ClusterRole::Follower,
            Some(now - chrono::Duration::seconds(30)),
            now
        ));
    }

    #[test]
    fn follower_acting_as_vip_leader_is_ready_without_sync() {
        let now = Utc::now();
        assert!(is_ready(ClusterRole::Follower, ClusterRole::Leader, None, now));
    }

    #[test]
    fn readonly_guard_allows_cluster_and_health_paths() {
        assert!(!rejects_as_readonly(ClusterRole::Follower, true, "/api/cluster/status"));
        assert!(!rejects_as_readonly(ClusterRole::Follower, true, "/api/health"));
        assert!(!rejects_as_readonly(ClusterRole::Follower, true, "/api/query-logs/ingest"));
    }

    #[test]
    fn readonly_guard_blocks_other_mutations() {
        assert!(rejects_as_readonly(ClusterRole::Follower, true, "/api/clients/5"));
    }

    #[test]
    fn readonly_guard_inactive_when_cluster_disabled_or_not_follower() {
        assert!(!rejects_as_readonly(ClusterRole::Follower, false, "/api/clients/5"));
        assert!(!rejects_as_readonly(ClusterRole::Leader, true, "/api/clients/5"));
    }
}
