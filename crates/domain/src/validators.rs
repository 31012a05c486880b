//! Pure validation and normalization helpers shared across the policy engine,
//! the blocklist compiler and the rule repositories.
//!
//! Every function here is a pure function over `&str` — no I/O, no clock.

use crate::errors::DomainError;

/// Normalize a domain name the way every rule, rewrite and query must be
/// normalized before comparison: lowercase, trim whitespace, strip a single
/// trailing dot.
///
/// `normalize(normalize(x)) == normalize(x)` for all `x` (idempotent), and
/// `normalize` maps any case variant of a name to the same key.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('.').unwrap_or(trimmed);
    trimmed.to_ascii_lowercase()
}

/// Validate a normalized domain per the blocklist-ingest rules (spec §4.3):
/// 1..253 chars, must contain a dot, only `[a-z0-9.-]`, no leading/trailing
/// hyphen on any label, no `..`.
pub fn validate_domain(domain: &str) -> Result<(), DomainError> {
    let err = || DomainError::InvalidDomainName(domain.to_string());

    if domain.is_empty() || domain.len() > 253 {
        return Err(err());
    }
    if !domain.contains('.') {
        return Err(err());
    }
    if domain.contains("..") {
        return Err(err());
    }
    if !domain
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        return Err(err());
    }
    for label in domain.split('.') {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return Err(err());
        }
    }
    Ok(())
}

/// Produce the ordered suffix walk for a query name: the normalized full
/// name, then each progressively shorter suffix, stopping at (and
/// including) the final two labels (the "TLD + one label" floor) so a
/// bare TLD is never tested in isolation.
///
/// `candidates("a.b.example.com")` ⊇ `candidates("b.example.com")` as a
/// suffix sequence (monotonicity invariant, spec §8 invariant 2).
pub fn candidate_suffixes(query_name: &str) -> Vec<String> {
    let normalized = normalize_domain(query_name);
    let labels: Vec<&str> = normalized.split('.').filter(|l| !l.is_empty()).collect();

    if labels.len() < 2 {
        return if normalized.is_empty() {
            Vec::new()
        } else {
            vec![normalized]
        };
    }

    let mut out = Vec::with_capacity(labels.len() - 1);
    for start in 0..=labels.len() - 2 {
        out.push(labels[start..].join("."));
    }
    out
}

/// Validate that a CIDR string is well-formed (`ipnetwork` parseable).
pub fn validate_cidr(cidr: &str) -> Result<ipnetwork::IpNetwork, DomainError> {
    if cidr.is_empty() || !cidr.contains('/') {
        return Err(DomainError::InvalidCidr(cidr.to_string()));
    }
    cidr.parse::<ipnetwork::IpNetwork>()
        .map_err(|_| DomainError::InvalidCidr(cidr.to_string()))
}

/// Normalize a client IP the way the listener must before any policy lookup
/// (spec §4.1): strip the `::ffff:` IPv4-mapped prefix, drop an IPv6 zone
/// id, trim whitespace; empty input becomes `0.0.0.0`.
pub fn normalize_client_ip(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "0.0.0.0".to_string();
    }

    let without_zone = trimmed.split('%').next().unwrap_or(trimmed);

    if let Some(rest) = without_zone.strip_prefix("::ffff:") {
        return rest.to_string();
    }

    without_zone.to_string()
}

/// Tailscale address range detection (spec §4.1).
pub fn is_tailscale_ip(ip: std::net::IpAddr) -> bool {
    match ip {
        std::net::IpAddr::V4(v4) => {
            let net: ipnetwork::Ipv4Network = "100.64.0.0/10".parse().unwrap();
            net.contains(v4)
        }
        std::net::IpAddr::V6(v6) => {
            let net: ipnetwork::Ipv6Network = "fd7a:115c:a1e0::/48".parse().unwrap();
            net.contains(v6)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent_and_case_insensitive() {
        let a = normalize_domain("Example.COM.");
        let b = normalize_domain(&a);
        assert_eq!(a, b);
        assert_eq!(a, "example.com");
        assert_eq!(normalize_domain("EXAMPLE.com"), normalize_domain("example.COM"));
    }

    #[test]
    fn candidates_monotonicity() {
        let a = candidate_suffixes("a.b.example.com");
        let b = candidate_suffixes("b.example.com");
        // every suffix of b.example.com must also appear walking a.b.example.com
        for s in &b {
            assert!(a.contains(s), "missing suffix {s} in {a:?}");
        }
    }

    #[test]
    fn candidates_stop_at_two_labels() {
        let c = candidate_suffixes("www.ads.example.com");
        assert_eq!(
            c,
            vec![
                "www.ads.example.com".to_string(),
                "ads.example.com".to_string(),
                "example.com".to_string(),
            ]
        );
    }

    #[test]
    fn validate_domain_rejects_bad_shapes() {
        assert!(validate_domain("example.com").is_ok());
        assert!(validate_domain("localhost").is_err()); // no dot
        assert!(validate_domain("ex..ample.com").is_err());
        assert!(validate_domain("-bad.com").is_err());
        assert!(validate_domain("bad-.com").is_err());
        assert!(validate_domain("UPPER.COM").is_err()); // must already be normalized
    }

    #[test]
    fn client_ip_normalization() {
        assert_eq!(normalize_client_ip("::ffff:192.168.1.1"), "192.168.1.1");
        assert_eq!(normalize_client_ip("fe80::1%eth0"), "fe80::1");
        assert_eq!(normalize_client_ip("   "), "0.0.0.0");
        assert_eq!(normalize_client_ip(""), "0.0.0.0");
    }

    #[test]
    fn tailscale_detection() {
        assert!(is_tailscale_ip("100.100.1.1".parse().unwrap()));
        assert!(!is_tailscale_ip("192.168.1.1".parse().unwrap()));
        assert!(is_tailscale_ip("fd7a:115c:a1e0::1".parse().unwrap()));
    }
}
