use crate::errors::DomainError;
use std::sync::Arc;

/// A rule's verdict when matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleType {
    Blocked,
    Allowed,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Blocked => "BLOCKED",
            RuleType::Allowed => "ALLOWED",
        }
    }
}

impl std::str::FromStr for RuleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BLOCKED" => Ok(RuleType::Blocked),
            "ALLOWED" => Ok(RuleType::Allowed),
            other => Err(DomainError::InvalidRuleScope(other.to_string())),
        }
    }
}

/// The kind of client-policy-originated block a rule can represent.
///
/// These never live in the `rules` table as actual rows; they are
/// synthesized `blocklistId` annotations produced directly by the policy
/// engine (spec §4.2 phases 1, 3 and 6) and are encoded here only so the
/// query log can carry a single `RuleScope`-shaped reason for every
/// blocked decision, matching spec's `ClientPolicy:<kind>` convention.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClientPolicyKind {
    InternetPaused,
    BlockAll,
    App(Arc<str>),
}

impl ClientPolicyKind {
    fn encode(&self) -> String {
        match self {
            ClientPolicyKind::InternetPaused => "InternetPaused".to_string(),
            ClientPolicyKind::BlockAll => "BlockAll".to_string(),
            ClientPolicyKind::App(id) => format!("App:{id}"),
        }
    }

    fn decode(s: &str) -> Result<Self, DomainError> {
        if s == "InternetPaused" {
            return Ok(ClientPolicyKind::InternetPaused);
        }
        if s == "BlockAll" {
            return Ok(ClientPolicyKind::BlockAll);
        }
        if let Some(app) = s.strip_prefix("App:") {
            return Ok(ClientPolicyKind::App(Arc::from(app)));
        }
        Err(DomainError::InvalidRuleScope(s.to_string()))
    }
}

/// Replaces the heterogeneous `category` string conventions of the source
/// system with an enum that has a single, bijective string encoding used
/// only at the storage/log boundary (spec §9 redesign note).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RuleScope {
    Manual,
    Client(i64),
    Subnet(i64),
    Blocklist(i64),
    ClientPolicy(ClientPolicyKind),
}

impl RuleScope {
    /// Encode to the `category` string stored in the `rules` table / the
    /// `blocklistId` field of a query-log entry.
    pub fn encode(&self) -> String {
        match self {
            RuleScope::Manual => "Manual".to_string(),
            RuleScope::Client(id) => format!("Client:{id}"),
            RuleScope::Subnet(id) => format!("Subnet:{id}"),
            RuleScope::Blocklist(id) => format!("Blocklist:{id}"),
            RuleScope::ClientPolicy(kind) => format!("ClientPolicy:{}", kind.encode()),
        }
    }

    /// Decode a stored `category` string back into a `RuleScope`. Accepts
    /// the legacy `Client:<id>:...` / `Subnet:<id>:...` multi-segment form
    /// (spec §4.3 "legacy `Blocklist:<id>:<name>`") by only looking at the
    /// first two colon-separated segments.
    pub fn decode(category: &str) -> Result<Self, DomainError> {
        if category == "Manual" {
            return Ok(RuleScope::Manual);
        }
        let mut parts = category.splitn(3, ':');
        let head = parts.next().unwrap_or("");
        let id_str = parts.next();
        match head {
            "Client" => id_str
                .and_then(|s| s.parse::<i64>().ok())
                .map(RuleScope::Client)
                .ok_or_else(|| DomainError::InvalidRuleScope(category.to_string())),
            "Subnet" => id_str
                .and_then(|s| s.parse::<i64>().ok())
                .map(RuleScope::Subnet)
                .ok_or_else(|| DomainError::InvalidRuleScope(category.to_string())),
            "Blocklist" => id_str
                .and_then(|s| s.parse::<i64>().ok())
                .map(RuleScope::Blocklist)
                .ok_or_else(|| DomainError::InvalidRuleScope(category.to_string())),
            "ClientPolicy" => {
                let rest = category
                    .strip_prefix("ClientPolicy:")
                    .ok_or_else(|| DomainError::InvalidRuleScope(category.to_string()))?;
                ClientPolicyKind::decode(rest).map(RuleScope::ClientPolicy)
            }
            _ => Err(DomainError::InvalidRuleScope(category.to_string())),
        }
    }

    /// The blocklist id this scope's rules belong to under the legacy
    /// `Blocklist:<id>:<name>` category convention, if any (used by the
    /// refresh atomicity step to delete stray legacy rows, spec §4.3).
    pub fn blocklist_id(&self) -> Option<i64> {
        match self {
            RuleScope::Blocklist(id) => Some(*id),
            _ => None,
        }
    }
}

/// A single manual or blocklist-sourced rule.
///
/// Uniqueness invariant (enforced at the repository layer): `(domain,
/// rule_type, category)` is unique.
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: Option<i64>,
    pub domain: Arc<str>,
    pub rule_type: RuleType,
    pub scope: RuleScope,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Rule {
    pub fn new(domain: impl Into<Arc<str>>, rule_type: RuleType, scope: RuleScope) -> Self {
        Self {
            id: None,
            domain: domain.into(),
            rule_type,
            scope,
            created_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_roundtrip() {
        for scope in [
            RuleScope::Manual,
            RuleScope::Client(42),
            RuleScope::Subnet(7),
            RuleScope::Blocklist(3),
            RuleScope::ClientPolicy(ClientPolicyKind::InternetPaused),
            RuleScope::ClientPolicy(ClientPolicyKind::BlockAll),
            RuleScope::ClientPolicy(ClientPolicyKind::App(Arc::from("discord"))),
        ] {
            let encoded = scope.encode();
            let decoded = RuleScope::decode(&encoded).unwrap();
            assert_eq!(scope, decoded, "roundtrip failed for {encoded}");
        }
    }

    #[test]
    fn legacy_blocklist_category_decodes() {
        let decoded = RuleScope::decode("Blocklist:3:some-legacy-name").unwrap();
        assert_eq!(decoded, RuleScope::Blocklist(3));
    }
}
