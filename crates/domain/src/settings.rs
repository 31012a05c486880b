use crate::errors::DomainError;
use crate::rewrite::DnsRewrite;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upstream forwarding transport (spec §4.1 "Upstream transport selection").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardTransport {
    Udp,
    Tcp,
    Dot,
    Doh,
}

impl ForwardTransport {
    pub fn default_timeout_ms(&self) -> u64 {
        match self {
            ForwardTransport::Udp => 2000,
            ForwardTransport::Tcp => 4000,
            ForwardTransport::Dot => 4000,
            ForwardTransport::Doh => 15000,
        }
    }
}

/// The `dns_settings` singleton: how the forwarder reaches upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsForwardSettings {
    pub upstream_servers: Vec<String>,
    pub transport: ForwardTransport,
    pub prefer_ipv4: bool,
    pub response_cache_enabled: bool,
    pub response_cache_max_entries: usize,
}

impl Default for DnsForwardSettings {
    fn default() -> Self {
        Self {
            upstream_servers: vec!["1.1.1.1:53".to_string()],
            transport: ForwardTransport::Udp,
            prefer_ipv4: true,
            response_cache_enabled: true,
            response_cache_max_entries: 50_000,
        }
    }
}

/// `protection_pause` singleton mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PauseMode {
    Off,
    Until,
    Forever,
}

/// The administrative protection-pause flag (spec §4.2 phase 1, glossary
/// "Protection pause").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtectionPause {
    pub mode: PauseMode,
    pub until: Option<DateTime<Utc>>,
}

impl Default for ProtectionPause {
    fn default() -> Self {
        Self {
            mode: PauseMode::Off,
            until: None,
        }
    }
}

impl ProtectionPause {
    /// Whether blocking is currently bypassed for non-kill-switched
    /// clients.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.mode {
            PauseMode::Off => false,
            PauseMode::Forever => true,
            PauseMode::Until => self.until.map(|u| now < u).unwrap_or(false),
        }
    }
}

/// A strongly typed replacement for the source system's runtime-typed
/// `settings.value` JSON column (spec §9 redesign note). Known keys decode
/// into a concrete variant; anything else falls back to `Opaque` so unknown
/// settings keys still round-trip without data loss.
#[derive(Debug, Clone)]
pub enum SettingsValue {
    Dns(DnsForwardSettings),
    ProtectionPause(ProtectionPause),
    Rewrites(Vec<RewriteRecord>),
    Opaque(serde_json::Value),
}

/// A `DnsRewrite` in its settings-storage shape (the domain entity's
/// `RewriteTarget` enum serialized as a single string, spec §3 "DNS
/// rewrite ... stored as a single JSON settings record").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRecord {
    pub id: Option<i64>,
    pub domain: String,
    pub target: String,
}

impl From<&DnsRewrite> for RewriteRecord {
    fn from(r: &DnsRewrite) -> Self {
        Self {
            id: r.id,
            domain: r.domain.to_string(),
            target: r.target.to_storage_string(),
        }
    }
}

pub const SETTINGS_KEY_DNS: &str = "dns_settings";
pub const SETTINGS_KEY_PROTECTION_PAUSE: &str = "protection_pause";
pub const SETTINGS_KEY_DNS_REWRITES: &str = "dns_rewrites";
pub const SETTINGS_KEY_AUTH_ADMIN: &str = "auth_admin";
pub const SETTINGS_KEY_DISCOVERY: &str = "discovery_settings";

/// Reserved settings key prefixes that a cluster snapshot export must
/// strip (spec §4.4 "excluding `secret:*` and `cluster_*`").
pub fn is_cluster_private_key(key: &str) -> bool {
    key.starts_with("cluster_") || key.starts_with("secret:")
}

impl SettingsValue {
    pub fn decode(key: &str, raw: &serde_json::Value) -> Result<Self, DomainError> {
        let err = |e: serde_json::Error| DomainError::InvalidSettingsValue(key.to_string(), e.to_string());
        match key {
            SETTINGS_KEY_DNS => Ok(SettingsValue::Dns(
                serde_json::from_value(raw.clone()).map_err(err)?,
            )),
            SETTINGS_KEY_PROTECTION_PAUSE => Ok(SettingsValue::ProtectionPause(
                serde_json::from_value(raw.clone()).map_err(err)?,
            )),
            SETTINGS_KEY_DNS_REWRITES => Ok(SettingsValue::Rewrites(
                serde_json::from_value(raw.clone()).map_err(err)?,
            )),
            _ => Ok(SettingsValue::Opaque(raw.clone())),
        }
    }

    pub fn encode(&self) -> serde_json::Value {
        match self {
            SettingsValue::Dns(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            SettingsValue::ProtectionPause(v) => {
                serde_json::to_value(v).unwrap_or(serde_json::Value::Null)
            }
            SettingsValue::Rewrites(v) => serde_json::to_value(v).unwrap_or(serde_json::Value::Null),
            SettingsValue::Opaque(v) => v.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pause_forever_is_always_active() {
        let p = ProtectionPause {
            mode: PauseMode::Forever,
            until: None,
        };
        assert!(p.is_active(Utc::now()));
    }

    #[test]
    fn pause_until_expires() {
        let past = Utc::now() - chrono::Duration::minutes(5);
        let p = ProtectionPause {
            mode: PauseMode::Until,
            until: Some(past),
        };
        assert!(!p.is_active(Utc::now()));
    }

    #[test]
    fn unknown_key_decodes_opaque() {
        let raw = serde_json::json!({"foo": "bar"});
        let decoded = SettingsValue::decode("discord_webhook", &raw).unwrap();
        assert!(matches!(decoded, SettingsValue::Opaque(_)));
    }

    #[test]
    fn cluster_private_keys_detected() {
        assert!(is_cluster_private_key("cluster_psk"));
        assert!(is_cluster_private_key("secret:admin_token"));
        assert!(!is_cluster_private_key("dns_settings"));
    }
}
