use crate::geo::{is_private_or_local, GeoLookup, GeoReason};
use chrono::{DateTime, Utc};
use sentinel_application::ports::QueryLogRepository;
use sentinel_application::AppError;
use sentinel_domain::{QueryStatus, RecordType};
use std::collections::HashMap;

/// One resolved location's share of the window (spec §4.6 "Geo
/// aggregation"). Coordinates are already grid-bucketed by `GeoLookup`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoBucket {
    pub country: String,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub count: u64,
}

/// One "couldn't be placed on the map" bucket, keyed by why (spec §4.6:
/// "missing IPs bucketed by reason").
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoMiss {
    pub reason: &'static str,
    pub count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct GeoAggregate {
    pub located: Vec<GeoBucket>,
    pub missing: Vec<GeoMiss>,
}

/// Joins query-log entries since `since` with `geo`, resolving each
/// entry's first answer IP to a country/city and grouping the rest by
/// why they couldn't be placed (spec §4.6 "for each entry, pick first
/// `answerIps[]`..., resolve..., bucket by reason").
pub async fn aggregate_geo(
    log: &dyn QueryLogRepository,
    geo: &GeoLookup,
    since: DateTime<Utc>,
    limit: usize,
) -> Result<GeoAggregate, AppError> {
    let entries = log.query(since, None, None, limit).await?;

    let mut located: HashMap<(String, Option<String>), GeoBucket> = HashMap::new();
    let mut missing: HashMap<&'static str, u64> = HashMap::new();
    let mut bump_missing = |reason: GeoReason| *missing.entry(reason.label()).or_insert(0) += 1;

    for entry in &entries {
        let Some(&ip) = entry.answer_ips.first() else {
            let reason = if matches!(entry.status, QueryStatus::Blocked | QueryStatus::ShadowBlocked) {
                GeoReason::BlockedNoIpAnswers
            } else if !matches!(entry.record_type, RecordType::A | RecordType::Aaaa) {
                GeoReason::NonAddressAnswer
            } else {
                GeoReason::LookupMiss
            };
            bump_missing(reason);
            continue;
        };

        if is_private_or_local(ip) {
            bump_missing(GeoReason::PrivateNetwork);
            continue;
        }

        match geo.lookup(ip) {
            Some(loc) => {
                let bucket = located.entry((loc.country.clone(), loc.city.clone())).or_insert_with(|| GeoBucket {
                    country: loc.country,
                    city: loc.city,
                    lat: loc.lat,
                    lng: loc.lng,
                    count: 0,
                });
                bucket.count += 1;
            }
            None => bump_missing(GeoReason::LookupMiss),
        }
    }

    let mut located: Vec<GeoBucket> = located.into_values().collect();
    located.sort_by(|a, b| b.count.cmp(&a.count));

    let mut missing: Vec<GeoMiss> = missing.into_iter().map(|(reason, count)| GeoMiss { reason, count }).collect();
    missing.sort_by(|a, b| b.count.cmp(&a.count));

    Ok(GeoAggregate { located, missing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_application::ports::LogAggregates;
    use sentinel_domain::QueryLogEntry;
    use std::net::{IpAddr, Ipv4Addr};
    use std::path::PathBuf;

    struct FixtureLog(Vec<QueryLogEntry>);

    #[async_trait]
    impl QueryLogRepository for FixtureLog {
        async fn append(&self, _entry: QueryLogEntry) -> Result<(), AppError> {
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
            Ok(self.0.clone())
        }
        async fn aggregates(&self, _since: DateTime<Utc>, _exclude_hostnames: &[String]) -> Result<LogAggregates, AppError> {
            Ok(LogAggregates::default())
        }
        async fn delete_older_than(&self, _cutoff: DateTime<Utc>, _batch_size: usize) -> Result<u64, AppError> {
            Ok(0)
        }
    }

    fn entry(status: QueryStatus, record_type: RecordType, answer_ips: Vec<IpAddr>) -> QueryLogEntry {
        let mut e = QueryLogEntry::new("example.test", record_type, "10.0.0.5", status, 5);
        e.answer_ips = answer_ips;
        e
    }

    #[tokio::test]
    async fn missing_ips_bucket_by_reason() {
        let entries = vec![
            entry(QueryStatus::Blocked, RecordType::A, vec![]),
            entry(QueryStatus::Permitted, RecordType::Txt, vec![]),
            entry(QueryStatus::Permitted, RecordType::A, vec![IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))]),
        ];
        let log = FixtureLog(entries);
        let geo = GeoLookup::new(PathBuf::from("/nonexistent/GeoLite2-City.mmdb"));

        let result = aggregate_geo(&log, &geo, Utc::now() - chrono::Duration::hours(1), 100).await.unwrap();

        assert!(result.located.is_empty());
        let by_reason: HashMap<&str, u64> = result.missing.into_iter().map(|m| (m.reason, m.count)).collect();
        assert_eq!(by_reason.get("Blocked (no IP answers)"), Some(&1));
        assert_eq!(by_reason.get("No IP answers (non-A/AAAA)"), Some(&1));
        assert_eq!(by_reason.get("Private Network"), Some(&1));
    }
}
