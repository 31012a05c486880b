use crate::errors::DomainError;
use crate::validators::normalize_domain;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::Arc;

/// The synthesized target of a DNS rewrite: either an address literal
/// (produces a local A/AAAA answer) or a hostname (produces a CNAME,
/// spec §4.1 answer synthesis).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteTarget {
    V4(Ipv4Addr),
    V6(Ipv6Addr),
    Hostname(Arc<str>),
}

impl RewriteTarget {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(v4) = trimmed.parse::<Ipv4Addr>() {
            return RewriteTarget::V4(v4);
        }
        if let Ok(v6) = trimmed.parse::<Ipv6Addr>() {
            return RewriteTarget::V6(v6);
        }
        RewriteTarget::Hostname(Arc::from(normalize_domain(trimmed)))
    }

    pub fn to_storage_string(&self) -> String {
        match self {
            RewriteTarget::V4(v4) => v4.to_string(),
            RewriteTarget::V6(v6) => v6.to_string(),
            RewriteTarget::Hostname(h) => h.to_string(),
        }
    }
}

/// A single DNS rewrite entry (spec §3).
///
/// Matching is exact on the normalized domain by default (spec §9 open
/// question: wildcard semantics are not specified by the source system,
/// so this implementation matches exactly and does not extend to
/// wildcards — see DESIGN.md).
#[derive(Debug, Clone)]
pub struct DnsRewrite {
    pub id: Option<i64>,
    pub domain: Arc<str>,
    pub target: RewriteTarget,
}

impl DnsRewrite {
    pub fn new(domain: &str, target_raw: &str) -> Result<Self, DomainError> {
        let normalized = normalize_domain(domain);
        if normalized.is_empty() {
            return Err(DomainError::InvalidDomainName(domain.to_string()));
        }
        Ok(Self {
            id: None,
            domain: Arc::from(normalized),
            target: RewriteTarget::parse(target_raw),
        })
    }

    pub fn matches(&self, query_name: &str) -> bool {
        normalize_domain(query_name) == *self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_parsing() {
        assert_eq!(
            RewriteTarget::parse("1.2.3.4"),
            RewriteTarget::V4("1.2.3.4".parse().unwrap())
        );
        assert_eq!(
            RewriteTarget::parse("::1"),
            RewriteTarget::V6("::1".parse().unwrap())
        );
        assert!(matches!(
            RewriteTarget::parse("Target.Example.com."),
            RewriteTarget::Hostname(h) if &*h == "target.example.com"
        ));
    }

    #[test]
    fn rewrite_matches_exact_normalized() {
        let r = DnsRewrite::new("Foo.Example.com.", "1.1.1.1").unwrap();
        assert!(r.matches("foo.example.com"));
        assert!(r.matches("FOO.EXAMPLE.COM."));
        assert!(!r.matches("bar.foo.example.com"));
    }
}
