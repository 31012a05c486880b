use crate::errors::DomainError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configured (stored) cluster role. Governs the follower read-only guard
/// regardless of the effective role (spec §3 "configured follower is
/// always read-only").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterRole {
    Standalone,
    Leader,
    Follower,
}

impl ClusterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterRole::Standalone => "standalone",
            ClusterRole::Leader => "leader",
            ClusterRole::Follower => "follower",
        }
    }
}

impl std::str::FromStr for ClusterRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standalone" => Ok(ClusterRole::Standalone),
            "leader" => Ok(ClusterRole::Leader),
            "follower" => Ok(ClusterRole::Follower),
            other => Err(DomainError::InvalidClientProfile(format!(
                "invalid cluster role: {other}"
            ))),
        }
    }
}

/// The `cluster_*` settings singleton (spec §3 "Cluster config").
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub enabled: bool,
    pub role: ClusterRole,
    pub leader_url: Option<String>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            role: ClusterRole::Standalone,
            leader_url: None,
        }
    }
}

/// The effective role after applying a filesystem role-override (spec §4.4
/// "Roles", glossary "Effective role"). Only affects which behaviors run
/// (e.g. whether the follower sync loop ticks); never overrides the
/// read-only guard, which is keyed on the *stored* role.
pub fn effective_role(stored: ClusterRole, overridden: Option<ClusterRole>) -> ClusterRole {
    overridden.unwrap_or(stored)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JoinCodePayload {
    #[serde(rename = "leaderUrl")]
    leader_url: String,
    psk: String,
    #[serde(rename = "createdAt")]
    created_at: DateTime<Utc>,
}

/// A leader-issued join code (spec §4.4 "Join code").
#[derive(Debug, Clone)]
pub struct JoinCode {
    pub leader_url: String,
    pub psk: String,
    pub created_at: DateTime<Utc>,
}

impl JoinCode {
    pub fn new(leader_url: impl Into<String>, psk: impl Into<String>) -> Self {
        Self {
            leader_url: leader_url.into(),
            psk: psk.into(),
            created_at: Utc::now(),
        }
    }

    /// base64url-encoded UTF-8 JSON payload (spec §6 "Join-code format").
    pub fn encode(&self) -> String {
        let payload = JoinCodePayload {
            leader_url: self.leader_url.clone(),
            psk: self.psk.clone(),
            created_at: self.created_at,
        };
        let json = serde_json::to_vec(&payload).expect("JoinCodePayload is always serializable");
        URL_SAFE_NO_PAD.encode(json)
    }

    pub fn decode(encoded: &str) -> Result<Self, DomainError> {
        let err = || DomainError::InvalidJoinCode(encoded.to_string());
        let bytes = URL_SAFE_NO_PAD.decode(encoded).map_err(|_| err())?;
        let payload: JoinCodePayload = serde_json::from_slice(&bytes).map_err(|_| err())?;

        if !(payload.leader_url.starts_with("http://") || payload.leader_url.starts_with("https://"))
        {
            return Err(err());
        }
        if payload.psk.is_empty() {
            return Err(err());
        }

        Ok(Self {
            leader_url: payload.leader_url,
            psk: payload.psk,
            created_at: payload.created_at,
        })
    }

    /// Whether this join code is past its acceptance TTL (spec §4.4,
    /// default 60 min, spec §8 invariant 8).
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }
}
