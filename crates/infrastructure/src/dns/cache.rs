use sentinel_application::ports::{CacheStatsSnapshot, CachedAnswer, ResponseCachePort};
use sentinel_domain::RecordType;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// `queryName|type` (spec §4.1 "Response cache"). The name is stored
/// already normalized so `A.Example.com` and `a.example.com.` collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    record_type: RecordType,
}

struct Entry {
    wire_bytes: Vec<u8>,
    answer_ips: Vec<std::net::IpAddr>,
    expires_at: Instant,
}

/// Hit/miss counters exposed via `GET /api/cache/stats` (SPEC_FULL §5,
/// supplemented ambient observability — not a new DNS feature).
#[derive(Debug, Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub insertions: AtomicU64,
    pub evictions: AtomicU64,
}

/// Process-local response cache (spec §4.1, §5 "Response cache is
/// concurrent map with per-key last-writer-wins; no invalidation on
/// policy change within TTL"). Bounded by `max_entries` with LRU
/// eviction so a query flood can't grow it unbounded (SPEC_FULL §5).
pub struct ResponseCache {
    entries: Mutex<lru::LruCache<CacheKey, Entry>>,
    metrics: CacheMetrics,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: Mutex::new(lru::LruCache::new(capacity)),
            metrics: CacheMetrics::default(),
        }
    }

    /// Fresh cached answer for `(name, record_type)`, or `None` on a miss
    /// or an expired (but not yet evicted) entry. An expired entry is
    /// never served (invariant 10).
    pub fn get(&self, name: &str, record_type: RecordType) -> Option<(Vec<u8>, Vec<std::net::IpAddr>)> {
        let key = CacheKey { name: sentinel_domain::normalize_domain(name), record_type };
        let mut guard = self.entries.lock().expect("response cache mutex poisoned");
        match guard.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                Some((entry.wire_bytes.clone(), entry.answer_ips.clone()))
            }
            Some(_) => {
                guard.pop(&key);
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.metrics.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store an upstream answer using the minimum TTL across its answers.
    /// `min_ttl == Some(0)` or `None` means "do not cache" (spec §4.1
    /// "0 ⇒ do not cache").
    pub fn put(&self, name: &str, record_type: RecordType, wire_bytes: Vec<u8>, answer_ips: Vec<std::net::IpAddr>, min_ttl: Option<u32>) {
        let Some(ttl) = min_ttl.filter(|t| *t > 0) else {
            return;
        };
        let key = CacheKey { name: sentinel_domain::normalize_domain(name), record_type };
        let entry = Entry { wire_bytes, answer_ips, expires_at: Instant::now() + Duration::from_secs(ttl as u64) };

        let mut guard = self.entries.lock().expect("response cache mutex poisoned");
        let was_full = guard.len() == guard.cap().get();
        let evicted = guard.push(key, entry);
        self.metrics.insertions.fetch_add(1, Ordering::Relaxed);
        if was_full && evicted.is_some() {
            self.metrics.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn metrics(&self) -> CacheStatsSnapshot {
        let entries = self.entries.lock().expect("response cache mutex poisoned").len();
        CacheStatsSnapshot {
            hits: self.metrics.hits.load(Ordering::Relaxed),
            misses: self.metrics.misses.load(Ordering::Relaxed),
            insertions: self.metrics.insertions.load(Ordering::Relaxed),
            evictions: self.metrics.evictions.load(Ordering::Relaxed),
            entries,
        }
    }
}

/// Used when `dns_settings.response_cache_enabled` is `false` — every
/// lookup misses and nothing is ever stored.
pub struct NullResponseCache;

impl ResponseCachePort for NullResponseCache {
    fn get(&self, _name: &str, _record_type: RecordType) -> Option<CachedAnswer> {
        None
    }

    fn put(&self, _name: &str, _record_type: RecordType, _wire_bytes: Vec<u8>, _answer_ips: Vec<std::net::IpAddr>, _min_ttl: Option<u32>) {}

    fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot::default()
    }
}

impl ResponseCachePort for ResponseCache {
    fn get(&self, name: &str, record_type: RecordType) -> Option<CachedAnswer> {
        ResponseCache::get(self, name, record_type).map(|(wire_bytes, answer_ips)| CachedAnswer { wire_bytes, answer_ips })
    }

    fn put(&self, name: &str, record_type: RecordType, wire_bytes: Vec<u8>, answer_ips: Vec<std::net::IpAddr>, min_ttl: Option<u32>) {
        ResponseCache::put(self, name, record_type, wire_bytes, answer_ips, min_ttl)
    }

    fn stats(&self) -> CacheStatsSnapshot {
        ResponseCache::metrics(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stores_and_serves_fresh_entry() {
        let cache = ResponseCache::new(10);
        cache.put("example.com", RecordType::A, vec![1, 2, 3], vec!["1.2.3.4".parse().unwrap()], Some(60));
        let hit = cache.get("example.com", RecordType::A);
        assert!(hit.is_some());
        assert_eq!(cache.metrics().hits, 1);
    }

    #[test]
    fn zero_ttl_is_never_cached() {
        let cache = ResponseCache::new(10);
        cache.put("example.com", RecordType::A, vec![1], vec![], Some(0));
        assert!(cache.get("example.com", RecordType::A).is_none());
    }

    #[test]
    fn expired_entry_is_not_served() {
        let cache = ResponseCache::new(10);
        cache.put("example.com", RecordType::A, vec![1], vec![], Some(1));
        {
            let mut guard = cache.entries.lock().unwrap();
            let key = CacheKey { name: "example.com".to_string(), record_type: RecordType::A };
            guard.get_mut(&key).unwrap().expires_at = Instant::now() - Duration::from_secs(1);
        }
        assert!(cache.get("example.com", RecordType::A).is_none());
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let cache = ResponseCache::new(10);
        cache.put("Example.COM", RecordType::A, vec![9], vec![], Some(60));
        assert!(cache.get("example.com", RecordType::A).is_some());
    }

    #[test]
    fn bounded_capacity_evicts_lru() {
        let cache = ResponseCache::new(1);
        cache.put("a.test", RecordType::A, vec![1], vec![], Some(60));
        cache.put("b.test", RecordType::A, vec![2], vec![], Some(60));
        assert!(cache.get("a.test", RecordType::A).is_none());
        assert!(cache.get("b.test", RecordType::A).is_some());
        assert_eq!(cache.metrics().evictions, 1);
    }
}
