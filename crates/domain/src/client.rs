use crate::errors::DomainError;
use crate::schedule::Schedule;
use crate::validators::validate_cidr;
use std::net::IpAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientType {
    Laptop,
    Smartphone,
    Tv,
    Game,
    Iot,
    Tablet,
    Subnet,
}

/// A client (single device) or subnet profile (spec §3).
///
/// Invariant: a `Subnet` profile must carry a valid CIDR; any other type
/// carries an `ip` for the exact-match path.
#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub id: i64,
    pub client_type: ClientType,
    pub ip: Option<IpAddr>,
    pub cidr: Option<ipnetwork::IpNetwork>,
    pub is_internet_paused: bool,
    pub use_global_settings: bool,
    pub use_global_categories: bool,
    pub use_global_apps: bool,
    pub assigned_blocklists: Vec<i64>,
    pub blocked_categories: Vec<String>,
    pub blocked_apps: Vec<String>,
    pub schedules: Vec<Schedule>,
}

impl ClientProfile {
    /// Construct a single-device profile (exact IP match).
    pub fn new_device(id: i64, client_type: ClientType, ip: IpAddr) -> Self {
        Self {
            id,
            client_type,
            ip: Some(ip),
            cidr: None,
            is_internet_paused: false,
            use_global_settings: true,
            use_global_categories: true,
            use_global_apps: true,
            assigned_blocklists: Vec::new(),
            blocked_categories: Vec::new(),
            blocked_apps: Vec::new(),
            schedules: Vec::new(),
        }
    }

    /// Construct a subnet profile (longest-prefix CIDR match). Validates
    /// the CIDR is well-formed per spec §3 invariant.
    pub fn new_subnet(id: i64, cidr: &str) -> Result<Self, DomainError> {
        let network = validate_cidr(cidr)?;
        Ok(Self {
            id,
            client_type: ClientType::Subnet,
            ip: None,
            cidr: Some(network),
            is_internet_paused: false,
            use_global_settings: true,
            use_global_categories: true,
            use_global_apps: true,
            assigned_blocklists: Vec::new(),
            blocked_categories: Vec::new(),
            blocked_apps: Vec::new(),
            schedules: Vec::new(),
        })
    }

    pub fn is_subnet(&self) -> bool {
        self.client_type == ClientType::Subnet
    }
}

/// Resolves a client IP to the matching client/subnet profile using the
/// longest-prefix rule (spec §4.2 "Client resolution order"):
/// 1. Exact `profile.ip == clientIp` wins outright.
/// 2. Otherwise the subnet profile with the longest-prefix CIDR
///    containing `clientIp`.
/// 3. Otherwise `None` (global defaults apply).
pub struct ClientResolver {
    exact: std::collections::HashMap<IpAddr, Arc<ClientProfile>>,
    subnets: Vec<Arc<ClientProfile>>,
}

impl ClientResolver {
    pub fn build(profiles: Vec<Arc<ClientProfile>>) -> Self {
        let mut exact = std::collections::HashMap::new();
        let mut subnets = Vec::new();

        for p in profiles {
            if let Some(ip) = p.ip {
                exact.insert(ip, p.clone());
            } else if p.cidr.is_some() {
                subnets.push(p.clone());
            }
        }

        Self { exact, subnets }
    }

    pub fn resolve(&self, client_ip: IpAddr) -> Option<Arc<ClientProfile>> {
        if let Some(p) = self.exact.get(&client_ip) {
            return Some(p.clone());
        }

        let mut best: Option<(u8, &Arc<ClientProfile>)> = None;
        for p in &self.subnets {
            if let Some(net) = p.cidr {
                if net.contains(client_ip) {
                    let prefix = net.prefix();
                    match best {
                        None => best = Some((prefix, p)),
                        Some((best_prefix, _)) if prefix > best_prefix => best = Some((prefix, p)),
                        _ => {}
                    }
                }
            }
        }

        best.map(|(_, p)| p.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subnet_requires_valid_cidr() {
        assert!(ClientProfile::new_subnet(1, "not-a-cidr").is_err());
        assert!(ClientProfile::new_subnet(1, "10.0.0.0/24").is_ok());
    }

    #[test]
    fn exact_beats_subnet() {
        let exact = Arc::new(ClientProfile::new_device(
            1,
            ClientType::Laptop,
            "10.0.0.5".parse().unwrap(),
        ));
        let subnet = Arc::new(ClientProfile::new_subnet(2, "10.0.0.0/24").unwrap());
        let resolver = ClientResolver::build(vec![exact.clone(), subnet]);
        let resolved = resolver.resolve("10.0.0.5".parse().unwrap()).unwrap();
        assert_eq!(resolved.id, 1);
    }

    #[test]
    fn longest_prefix_wins() {
        let wide = Arc::new(ClientProfile::new_subnet(1, "10.0.0.0/16").unwrap());
        let narrow = Arc::new(ClientProfile::new_subnet(2, "10.0.0.0/24").unwrap());
        let resolver = ClientResolver::build(vec![wide, narrow]);
        let resolved = resolver.resolve("10.0.0.5".parse().unwrap()).unwrap();
        assert_eq!(resolved.id, 2);
    }

    #[test]
    fn no_match_returns_none() {
        let subnet = Arc::new(ClientProfile::new_subnet(1, "10.0.0.0/24").unwrap());
        let resolver = ClientResolver::build(vec![subnet]);
        assert!(resolver.resolve("192.168.1.1".parse().unwrap()).is_none());
    }
}
