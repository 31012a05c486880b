use sentinel_domain::{BlocklistMode, ClientProfile, ClientResolver, DnsRewrite, ProtectionPause, Rule, RuleScope, RuleType};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Enabled/mode/name for one blocklist, keyed by id (spec §4.2 "Index").
#[derive(Debug, Clone)]
pub struct BlocklistMeta {
    pub enabled: bool,
    pub mode: BlocklistMode,
    pub name: Arc<str>,
}

/// The built-once-per-refresh decision structure C2 reads from (spec §4.2
/// "Indexed state"). Immutable once built; the engine publishes a new one
/// atomically on refresh and readers take a local `Arc` clone for the
/// duration of a query (spec §5 "Shared state").
pub struct Index {
    manual_allowed_global: HashSet<String>,
    manual_blocked_global: HashSet<String>,
    manual_allowed_by_client: HashMap<i64, HashSet<String>>,
    manual_blocked_by_client: HashMap<i64, HashSet<String>>,
    manual_allowed_by_subnet: HashMap<i64, HashSet<String>>,
    manual_blocked_by_subnet: HashMap<i64, HashSet<String>>,
    /// domain → blocklist ids whose rule set contains it (union across
    /// blocklists, spec "blockedByDomain: Map<domain, OneOrMany<blocklistId>>").
    blocked_by_domain: HashMap<String, Vec<i64>>,
    blocklists_by_id: HashMap<i64, BlocklistMeta>,
    clients_by_id: HashMap<i64, Arc<ClientProfile>>,
    client_resolver: ClientResolver,
    rewrites: Vec<DnsRewrite>,
    pub protection_pause: ProtectionPause,
}

impl Index {
    pub fn resolve_client(&self, client_ip: std::net::IpAddr) -> Option<Arc<ClientProfile>> {
        self.client_resolver.resolve(client_ip)
    }

    pub fn client_by_id(&self, id: i64) -> Option<&Arc<ClientProfile>> {
        self.clients_by_id.get(&id)
    }

    pub fn rewrites(&self) -> &[DnsRewrite] {
        &self.rewrites
    }

    pub fn blocklist_meta(&self, id: i64) -> Option<&BlocklistMeta> {
        self.blocklists_by_id.get(&id)
    }

    pub fn manual_allowed_global(&self, suffix: &str) -> bool {
        self.manual_allowed_global.contains(suffix)
    }

    pub fn manual_blocked_global(&self, suffix: &str) -> bool {
        self.manual_blocked_global.contains(suffix)
    }

    pub fn manual_allowed_for_client(&self, client_id: i64, suffix: &str) -> bool {
        self.manual_allowed_by_client
            .get(&client_id)
            .is_some_and(|s| s.contains(suffix))
    }

    pub fn manual_blocked_for_client(&self, client_id: i64, suffix: &str) -> bool {
        self.manual_blocked_by_client
            .get(&client_id)
            .is_some_and(|s| s.contains(suffix))
    }

    pub fn manual_allowed_for_subnet(&self, subnet_id: i64, suffix: &str) -> bool {
        self.manual_allowed_by_subnet
            .get(&subnet_id)
            .is_some_and(|s| s.contains(suffix))
    }

    pub fn manual_blocked_for_subnet(&self, subnet_id: i64, suffix: &str) -> bool {
        self.manual_blocked_by_subnet
            .get(&subnet_id)
            .is_some_and(|s| s.contains(suffix))
    }

    /// Blocklist ids (enabled only) whose rule set contains `suffix`.
    pub fn blocklists_for_suffix(&self, suffix: &str) -> impl Iterator<Item = i64> + '_ {
        self.blocked_by_domain
            .get(suffix)
            .into_iter()
            .flatten()
            .copied()
            .filter(|id| self.blocklists_by_id.get(id).is_some_and(|m| m.enabled))
    }
}

/// Builds an `Index` from the flat rows a `PolicyDataPort` returns. Kept
/// separate from `Index` itself so the build step (grouping/deduping) is
/// unit-testable without a database.
#[derive(Default)]
pub struct IndexBuilder {
    rules: Vec<Rule>,
    clients: Vec<Arc<ClientProfile>>,
    blocklists: Vec<(i64, BlocklistMeta)>,
    rewrites: Vec<DnsRewrite>,
    protection_pause: ProtectionPause,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_clients(mut self, clients: Vec<Arc<ClientProfile>>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_blocklists(mut self, blocklists: Vec<(i64, BlocklistMeta)>) -> Self {
        self.blocklists = blocklists;
        self
    }

    pub fn with_rewrites(mut self, rewrites: Vec<DnsRewrite>) -> Self {
        self.rewrites = rewrites;
        self
    }

    pub fn with_protection_pause(mut self, pause: ProtectionPause) -> Self {
        self.protection_pause = pause;
        self
    }

    pub fn build(self) -> Index {
        let mut manual_allowed_global = HashSet::new();
        let mut manual_blocked_global = HashSet::new();
        let mut manual_allowed_by_client: HashMap<i64, HashSet<String>> = HashMap::new();
        let mut manual_blocked_by_client: HashMap<i64, HashSet<String>> = HashMap::new();
        let mut manual_allowed_by_subnet: HashMap<i64, HashSet<String>> = HashMap::new();
        let mut manual_blocked_by_subnet: HashMap<i64, HashSet<String>> = HashMap::new();
        let mut blocked_by_domain: HashMap<String, Vec<i64>> = HashMap::new();

        for rule in &self.rules {
            let domain = rule.domain.to_string();
            match (&rule.scope, rule.rule_type) {
                (RuleScope::Manual, RuleType::Allowed) => {
                    manual_allowed_global.insert(domain);
                }
                (RuleScope::Manual, RuleType::Blocked) => {
                    manual_blocked_global.insert(domain);
                }
                (RuleScope::Client(id), RuleType::Allowed) => {
                    manual_allowed_by_client.entry(*id).or_default().insert(domain);
                }
                (RuleScope::Client(id), RuleType::Blocked) => {
                    manual_blocked_by_client.entry(*id).or_default().insert(domain);
                }
                (RuleScope::Subnet(id), RuleType::Allowed) => {
                    manual_allowed_by_subnet.entry(*id).or_default().insert(domain);
                }
                (RuleScope::Subnet(id), RuleType::Blocked) => {
                    manual_blocked_by_subnet.entry(*id).or_default().insert(domain);
                }
                (RuleScope::Blocklist(id), RuleType::Blocked) => {
                    blocked_by_domain.entry(domain).or_default().push(*id);
                }
                _ => {}
            }
        }

        let blocklists_by_id = self.blocklists.into_iter().collect();
        let clients_by_id = self.clients.iter().map(|c| (c.id, c.clone())).collect();
        let client_resolver = ClientResolver::build(self.clients);

        Index {
            manual_allowed_global,
            manual_blocked_global,
            manual_allowed_by_client,
            manual_blocked_by_client,
            manual_allowed_by_subnet,
            manual_blocked_by_subnet,
            blocked_by_domain,
            blocklists_by_id,
            clients_by_id,
            client_resolver,
            rewrites: self.rewrites,
            protection_pause: self.protection_pause,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_domain::{ClientType, RuleScope as Scope};

    #[test]
    fn groups_rules_by_scope() {
        let rules = vec![
            Rule::new("manual-blocked.test", RuleType::Blocked, Scope::Manual),
            Rule::new("client-allowed.test", RuleType::Allowed, Scope::Client(1)),
            Rule::new("ads.example.com", RuleType::Blocked, Scope::Blocklist(7)),
        ];
        let index = IndexBuilder::new().with_rules(rules).build();

        assert!(index.manual_blocked_global("manual-blocked.test"));
        assert!(index.manual_allowed_for_client(1, "client-allowed.test"));
        assert!(index.blocklists_for_suffix("ads.example.com").next().is_none());
    }

    #[test]
    fn enabled_blocklist_surfaces_in_suffix_lookup() {
        let rules = vec![Rule::new("ads.example.com", RuleType::Blocked, Scope::Blocklist(7))];
        let index = IndexBuilder::new()
            .with_rules(rules)
            .with_blocklists(vec![(
                7,
                BlocklistMeta {
                    enabled: true,
                    mode: BlocklistMode::Active,
                    name: Arc::from("oisd"),
                },
            )])
            .build();

        let hits: Vec<i64> = index.blocklists_for_suffix("ads.example.com").collect();
        assert_eq!(hits, vec![7]);
    }

    #[test]
    fn disabled_blocklist_is_excluded() {
        let rules = vec![Rule::new("ads.example.com", RuleType::Blocked, Scope::Blocklist(7))];
        let index = IndexBuilder::new()
            .with_rules(rules)
            .with_blocklists(vec![(
                7,
                BlocklistMeta {
                    enabled: false,
                    mode: BlocklistMode::Active,
                    name: Arc::from("oisd"),
                },
            )])
            .build();

        assert!(index.blocklists_for_suffix("ads.example.com").next().is_none());
    }

    #[test]
    fn client_resolution_delegates_to_resolver() {
        let client = Arc::new(ClientProfile::new_device(
            1,
            ClientType::Laptop,
            "10.0.0.5".parse().unwrap(),
        ));
        let index = IndexBuilder::new().with_clients(vec![client]).build();
        assert_eq!(index.resolve_client("10.0.0.5".parse().unwrap()).unwrap().id, 1);
        assert!(index.client_by_id(1).is_some());
    }
}
