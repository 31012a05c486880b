use sentinel_domain::{ClientPolicyKind, Rule, RuleScope, RuleType};
use serde::{Deserialize, Serialize};

/// Wire shape for a manual rule (spec §6 `GET/POST /api/rules`). `scope`
/// mirrors the `category` encoding (`"Manual"`, `"Client:<id>"`,
/// `"Subnet:<id>"`) so API clients never need to parse rule internals.
#[derive(Debug, Serialize)]
pub struct RuleResponse {
    pub id: i64,
    pub domain: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    pub scope: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Rule> for RuleResponse {
    fn from(r: &Rule) -> Self {
        Self {
            id: r.id.unwrap_or(0),
            domain: r.domain.to_string(),
            rule_type: r.rule_type.as_str().to_string(),
            scope: r.scope.encode(),
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub domain: String,
    #[serde(rename = "type")]
    pub rule_type: String,
    /// `"manual"` (default), `"client:<id>"` or `"subnet:<id>"`.
    #[serde(default)]
    pub scope: Option<String>,
}

impl CreateRuleRequest {
    pub fn into_rule(self) -> Result<Rule, String> {
        let rule_type = match self.rule_type.to_uppercase().as_str() {
            "BLOCKED" => RuleType::Blocked,
            "ALLOWED" => RuleType::Allowed,
            other => return Err(format!("invalid rule type: {other}")),
        };
        let scope = match self.scope.as_deref() {
            None | Some("manual") | Some("Manual") => RuleScope::Manual,
            Some(raw) => parse_scope(raw)?,
        };
        Ok(Rule::new(self.domain, rule_type, scope))
    }
}

fn parse_scope(raw: &str) -> Result<RuleScope, String> {
    let (head, rest) = raw.split_once(':').unwrap_or((raw, ""));
    match head.to_lowercase().as_str() {
        "client" => rest
            .parse::<i64>()
            .map(RuleScope::Client)
            .map_err(|_| format!("invalid client id in scope: {raw}")),
        "subnet" => rest
            .parse::<i64>()
            .map(RuleScope::Subnet)
            .map_err(|_| format!("invalid subnet id in scope: {raw}")),
        "clientpolicy" => match rest {
            "InternetPaused" => Ok(RuleScope::ClientPolicy(ClientPolicyKind::InternetPaused)),
            "BlockAll" => Ok(RuleScope::ClientPolicy(ClientPolicyKind::BlockAll)),
            other => Err(format!("unsupported client policy scope: {other}")),
        },
        _ => Err(format!("unrecognized rule scope: {raw}")),
    }
}
