use crate::errors::AppError;
use crate::policy::{Decision, PolicyEngine};
use crate::ports::{QueryLogRepository, ResponseCachePort, UpstreamAnswer, UpstreamResolver};
use chrono::{DateTime, Utc};
use sentinel_domain::{normalize_client_ip, normalize_domain, QueryLogEntry, QueryStatus, RecordType, RewriteTarget};
use std::net::IpAddr;
use std::time::Duration;

/// C1's per-query state machine, minus wire parsing/encoding (spec §4.1
/// "State machine per query"). Returns the synthesized or forwarded
/// answer for the caller to encode into the reply; always appends exactly
/// one query-log entry.
pub struct QueryOutcome {
    pub decision: Decision,
    pub answer: Answer,
}

pub enum Answer {
    Forwarded(UpstreamAnswer),
    Cached { wire_bytes: Vec<u8>, answer_ips: Vec<IpAddr> },
    Synthesized(RewriteTarget),
    Blocked,
}

#[allow(clippy::too_many_arguments)]
pub async fn decide_query(
    engine: &PolicyEngine,
    upstream: &dyn UpstreamResolver,
    cache: &dyn ResponseCachePort,
    log: &dyn QueryLogRepository,
    query_wire: &[u8],
    query_name: &str,
    record_type: RecordType,
    raw_client_ip: &str,
    upstream_timeout: Duration,
    shadow_resolve_blocked: bool,
    now: DateTime<Utc>,
) -> Result<QueryOutcome, AppError> {
    let started = std::time::Instant::now();
    let client_ip_str = normalize_client_ip(raw_client_ip);
    let client_ip: IpAddr = client_ip_str.parse().unwrap_or(std::net::Ipv4Addr::UNSPECIFIED.into());

    let decision = engine.decide(query_name, client_ip, now);

    // Cache is only consulted/populated for permitted answers: the policy
    // check always runs first, so a domain that later becomes blocked
    // never serves a stale permitted answer from cache (spec §5).
    let mut cache_hit = false;
    let answer = match &decision {
        Decision::Permitted { .. } => match cache.get(query_name, record_type) {
            Some(hit) => {
                cache_hit = true;
                Answer::Cached { wire_bytes: hit.wire_bytes, answer_ips: hit.answer_ips }
            }
            None => {
                let upstream_answer = upstream.forward(query_wire, upstream_timeout).await?;
                cache.put(
                    query_name,
                    record_type,
                    upstream_answer.wire_bytes.clone(),
                    upstream_answer.answer_ips.clone(),
                    upstream_answer.min_ttl,
                );
                Answer::Forwarded(upstream_answer)
            }
        },
        Decision::Rewritten { target } => Answer::Synthesized(target.clone()),
        Decision::ShadowBlocked { .. } => {
            Answer::Forwarded(upstream.forward(query_wire, upstream_timeout).await?)
        }
        Decision::Blocked { .. } => {
            if shadow_resolve_blocked {
                // Analytics-only forward: the client still gets NXDOMAIN
                // (spec §4.1 "Shadow-resolve policy"), only the log gets
                // the upstream answer_ips.
                let _ = upstream.forward(query_wire, upstream_timeout).await;
            }
            Answer::Blocked
        }
    };

    let duration_ms = started.elapsed().as_millis().min(u32::MAX as u128) as u32;
    let status = match &decision {
        Decision::Permitted { .. } if cache_hit => QueryStatus::Cached,
        Decision::Permitted { .. } => QueryStatus::Permitted,
        Decision::Rewritten { .. } => QueryStatus::Permitted,
        Decision::ShadowBlocked { .. } => QueryStatus::ShadowBlocked,
        Decision::Blocked { .. } => QueryStatus::Blocked,
    };

    let answer_ips = match &answer {
        Answer::Forwarded(a) => a.answer_ips.clone(),
        Answer::Cached { answer_ips, .. } => answer_ips.clone(),
        Answer::Synthesized(RewriteTarget::V4(v4)) => vec![IpAddr::V4(*v4)],
        Answer::Synthesized(RewriteTarget::V6(v6)) => vec![IpAddr::V6(*v6)],
        Answer::Synthesized(RewriteTarget::Hostname(_)) | Answer::Blocked => Vec::new(),
    };

    let mut entry = QueryLogEntry::new(normalize_domain(query_name), record_type, client_ip_str, status, duration_ms);
    entry.timestamp = now;
    entry.answer_ips = answer_ips;
    entry.blocklist_id = decision.blocklist_id().map(|s| s.to_string());
    entry.protection_paused = if decision.protection_paused() { Some(true) } else { None };
    log.append(entry).await?;

    Ok(QueryOutcome { decision, answer })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::IndexBuilder;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeUpstream;
    #[async_trait]
    impl UpstreamResolver for FakeUpstream {
        async fn forward(&self, _query_wire: &[u8], _timeout: Duration) -> Result<UpstreamAnswer, AppError> {
            Ok(UpstreamAnswer {
                wire_bytes: vec![1, 2, 3],
                answer_ips: vec!["1.2.3.4".parse().unwrap()],
                min_ttl: Some(300),
            })
        }
    }

    #[derive(Default)]
    struct FakeCache {
        stored: Mutex<Option<(String, RecordType)>>,
    }
    impl ResponseCachePort for FakeCache {
        fn get(&self, _name: &str, _record_type: RecordType) -> Option<crate::ports::CachedAnswer> {
            None
        }
        fn put(&self, name: &str, record_type: RecordType, wire_bytes: Vec<u8>, answer_ips: Vec<IpAddr>, _min_ttl: Option<u32>) {
            let _ = (wire_bytes, answer_ips);
            *self.stored.lock().unwrap() = Some((name.to_string(), record_type));
        }
        fn stats(&self) -> crate::ports::CacheStatsSnapshot {
            crate::ports::CacheStatsSnapshot::default()
        }
    }

    struct AlwaysHitCache {
        wire_bytes: Vec<u8>,
    }
    impl ResponseCachePort for AlwaysHitCache {
        fn get(&self, _name: &str, _record_type: RecordType) -> Option<crate::ports::CachedAnswer> {
            Some(crate::ports::CachedAnswer { wire_bytes: self.wire_bytes.clone(), answer_ips: vec!["9.9.9.9".parse().unwrap()] })
        }
        fn put(&self, _name: &str, _record_type: RecordType, _wire_bytes: Vec<u8>, _answer_ips: Vec<IpAddr>, _min_ttl: Option<u32>) {}
        fn stats(&self) -> crate::ports::CacheStatsSnapshot {
            crate::ports::CacheStatsSnapshot::default()
        }
    }

    #[derive(Default)]
    struct FakeLog {
        entries: Mutex<Vec<QueryLogEntry>>,
    }
    #[async_trait]
    impl QueryLogRepository for FakeLog {
        async fn append(&self, entry: QueryLogEntry) -> Result<(), AppError> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }
        async fn append_batch(&self, _entries: Vec<QueryLogEntry>) -> Result<(), AppError> {
            Ok(())
        }
        async fn query(
            &self,
            _since: DateTime<Utc>,
            _domain: Option<&str>,
            _status: Option<&str>,
            _limit: usize,
        ) -> Result<Vec<QueryLogEntry>, AppError> {
            Ok(Vec::new())
        }
        async fn aggregates(
            &self,
            _since: DateTime<Utc>,
            _exclude_hostnames: &[String],
        ) -> Result<crate::ports::LogAggregates, AppError> {
            Ok(Default::default())
        }
        async fn delete_older_than(&self, _cutoff: DateTime<Utc>, _batch_size: usize) -> Result<u64, AppError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn permitted_query_forwards_and_logs() {
        let engine = PolicyEngine::new(IndexBuilder::new().build());
        let upstream = FakeUpstream;
        let cache = FakeCache::default();
        let log = FakeLog::default();

        let outcome = decide_query(
            &engine,
            &upstream,
            &cache,
            &log,
            &[0u8; 12],
            "allowed.test",
            RecordType::A,
            "127.0.0.1",
            Duration::from_millis(2000),
            false,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome.decision, Decision::Permitted { .. }));
        assert!(matches!(outcome.answer, Answer::Forwarded(_)));
        assert_eq!(log.entries.lock().unwrap().len(), 1);
        assert_eq!(log.entries.lock().unwrap()[0].status, QueryStatus::Permitted);
        assert_eq!(cache.stored.lock().unwrap().as_ref().unwrap().0, "allowed.test");
    }

    #[tokio::test]
    async fn cache_hit_produces_cached_status_without_forwarding() {
        let engine = PolicyEngine::new(IndexBuilder::new().build());
        let upstream = FakeUpstream;
        let cache = AlwaysHitCache { wire_bytes: vec![7, 7, 7] };
        let log = FakeLog::default();

        let outcome = decide_query(
            &engine,
            &upstream,
            &cache,
            &log,
            &[0u8; 12],
            "cached.test",
            RecordType::A,
            "127.0.0.1",
            Duration::from_millis(2000),
            false,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome.answer, Answer::Cached { .. }));
        assert_eq!(log.entries.lock().unwrap()[0].status, QueryStatus::Cached);
    }

    #[tokio::test]
    async fn blocked_query_never_forwards_without_shadow_resolve() {
        use sentinel_domain::{Rule, RuleScope, RuleType};
        let rules = vec![Rule::new("blocked.test", RuleType::Blocked, RuleScope::Manual)];
        let engine = PolicyEngine::new(IndexBuilder::new().with_rules(rules).build());
        let upstream = FakeUpstream;
        let cache = FakeCache::default();
        let log = FakeLog::default();

        let outcome = decide_query(
            &engine,
            &upstream,
            &cache,
            &log,
            &[0u8; 12],
            "blocked.test",
            RecordType::A,
            "127.0.0.1",
            Duration::from_millis(2000),
            false,
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(matches!(outcome.answer, Answer::Blocked));
        assert_eq!(log.entries.lock().unwrap()[0].status, QueryStatus::Blocked);
        assert_eq!(
            log.entries.lock().unwrap()[0].blocklist_id.as_deref(),
            Some("Manual")
        );
    }
}
