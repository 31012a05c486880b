use sentinel_domain::ClusterRole;

/// Re-reads the filesystem role-override path with a short TTL (spec §9
/// redesign note: "Role override via filesystem read on every check → a
/// small RoleResolver abstraction that re-reads with a short TTL").
/// Implemented in `infrastructure`; purely a cached file read, no async
/// needed since the TTL makes it cheap to call synchronously on the hot
/// readiness-check path.
pub trait RoleOverrideReader: Send + Sync {
    /// `Some(role)` if the override file exists and parses to `leader` or
    /// `follower`; `None` if absent or unparseable (stored role governs).
    fn read(&self) -> Option<ClusterRole>;
}
