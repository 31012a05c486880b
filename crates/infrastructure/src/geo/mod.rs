pub mod aggregate;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::warn;

pub use aggregate::{aggregate_geo, GeoAggregate, GeoBucket, GeoMiss};

const RESTAT_INTERVAL: Duration = Duration::from_secs(60);

/// Country/city resolved for one query-log entry's destination IP (spec
/// §4.6 "Geo aggregation"). Coordinates are already snapped to the 0.1°
/// grid so callers can group directly on them for map markers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub country: String,
    pub city: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// Bucket assigned to an entry that can't be geo-located (spec §4.6:
/// "missing IPs bucketed by reason").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoReason {
    PrivateNetwork,
    BlockedNoIpAnswers,
    NonAddressAnswer,
    LookupMiss,
}

impl GeoReason {
    pub fn label(&self) -> &'static str {
        match self {
            GeoReason::PrivateNetwork => "Private Network",
            GeoReason::BlockedNoIpAnswers => "Blocked (no IP answers)",
            GeoReason::NonAddressAnswer => "No IP answers (non-A/AAAA)",
            GeoReason::LookupMiss => "Unknown",
        }
    }
}

struct CachedReader {
    reader: maxminddb::Reader<Vec<u8>>,
    mtime: std::time::SystemTime,
    last_stat: Instant,
}

/// Wraps an mmap-cached MaxMind DB reader that re-stats the file at most
/// once every 60 s and reloads only when its mtime actually changes
/// (spec §4.6 "mmap-cached reader and mtime-based invalidation").
pub struct GeoLookup {
    path: PathBuf,
    cached: RwLock<Option<CachedReader>>,
}

impl GeoLookup {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    fn refresh_if_needed(&self) {
        let needs_stat = {
            let cached = self.cached.read().expect("geo cache rwlock is never poisoned");
            cached.as_ref().map(|c| c.last_stat.elapsed() >= RESTAT_INTERVAL).unwrap_or(true)
        };
        if !needs_stat {
            return;
        }

        let Ok(metadata) = std::fs::metadata(&self.path) else {
            return;
        };
        let Ok(mtime) = metadata.modified() else {
            return;
        };

        let mut cached = self.cached.write().expect("geo cache rwlock is never poisoned");
        let up_to_date = cached.as_ref().map(|c| c.mtime == mtime).unwrap_or(false);
        if up_to_date {
            if let Some(c) = cached.as_mut() {
                c.last_stat = Instant::now();
            }
            return;
        }

        match maxminddb::Reader::open_readfile(&self.path) {
            Ok(reader) => {
                *cached = Some(CachedReader {
                    reader,
                    mtime,
                    last_stat: Instant::now(),
                });
            }
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "failed to open GeoIP database");
            }
        }
    }

    /// Resolve `ip` to a location, or `None` if the database is absent,
    /// stale-and-unreadable, or the IP has no entry (spec §4.6).
    pub fn lookup(&self, ip: IpAddr) -> Option<GeoLocation> {
        if is_private_or_local(ip) {
            return None;
        }
        self.refresh_if_needed();

        let cached = self.cached.read().expect("geo cache rwlock is never poisoned");
        let reader = &cached.as_ref()?.reader;
        let city: maxminddb::geoip2::City = reader.lookup(ip).ok()??;

        let country = city.country.as_ref().and_then(|c| c.names.as_ref()).and_then(|n| n.get("en")).map(|s| s.to_string());
        let city_name = city.city.as_ref().and_then(|c| c.names.as_ref()).and_then(|n| n.get("en")).map(|s| s.to_string());
        let lat = city.location.as_ref().and_then(|l| l.latitude).map(bucket_coordinate);
        let lng = city.location.as_ref().and_then(|l| l.longitude).map(bucket_coordinate);

        country.map(|country| GeoLocation { country, city: city_name, lat, lng })
    }
}

pub fn is_private_or_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => v6.is_loopback() || (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Snaps a coordinate to a ~11 km (0.1°) grid for point-marker bucketing
/// (spec §4.6).
pub fn bucket_coordinate(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_v4_is_excluded() {
        assert!(is_private_or_local("10.0.0.5".parse().unwrap()));
        assert!(is_private_or_local("192.168.1.1".parse().unwrap()));
        assert!(is_private_or_local("127.0.0.1".parse().unwrap()));
        assert!(!is_private_or_local("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn grid_bucketing_rounds_to_one_decimal() {
        assert_eq!(bucket_coordinate(12.345), 12.3);
        assert_eq!(bucket_coordinate(12.349), 12.3);
        assert_eq!(bucket_coordinate(12.36), 12.4);
    }
}
