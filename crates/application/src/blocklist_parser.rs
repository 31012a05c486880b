use sentinel_domain::validators::{normalize_domain, validate_domain};

const MAX_DOWNLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Error raised when a downloaded blocklist body exceeds the hard byte
/// cap (spec §4.3 "Download ... on overflow fail with TOO_LARGE").
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("blocklist body exceeds {MAX_DOWNLOAD_BYTES} bytes")]
pub struct TooLarge;

pub fn check_download_size(body: &str) -> Result<(), TooLarge> {
    if body.len() > MAX_DOWNLOAD_BYTES {
        return Err(TooLarge);
    }
    Ok(())
}

/// Parse one raw line from a hostlist source into a normalized, valid
/// domain, or `None` if the line carries no rule (comment, exception,
/// cosmetic filter, malformed, or rejected as localhost) (spec §4.3
/// "Parsing").
pub fn parse_line(raw: &str) -> Option<String> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return None;
    }
    if line.starts_with("@@") || line.starts_with("##") || line.starts_with("#@#") || line.starts_with("#?#") {
        return None;
    }

    let candidate = if let Some(rest) = line.strip_prefix("||") {
        let rest = rest.strip_prefix("*.").unwrap_or(rest);
        take_until_any(rest, &['^', '/', ':'])
    } else if let Some(rest) = line.strip_prefix('|') {
        host_from_url(rest)?
    } else if line.starts_with("http://") || line.starts_with("https://") {
        host_from_url(line)?
    } else {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        match tokens.next() {
            Some(second) if looks_like_ip(first) => second.to_string(),
            _ => first.to_string(),
        }
    };

    let normalized = normalize_domain(&candidate);
    if normalized == "localhost" || normalized.ends_with(".localhost") {
        return None;
    }
    validate_domain(&normalized).ok()?;
    Some(normalized)
}

/// Parse every line of a downloaded blocklist body into the deduplicated
/// set of valid domains it carries, preserving first-seen order.
pub fn parse_body(body: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for line in body.lines() {
        if let Some(domain) = parse_line(line) {
            if seen.insert(domain.clone()) {
                out.push(domain);
            }
        }
    }
    out
}

fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with('!') || trimmed.starts_with("//") {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn take_until_any(s: &str, stops: &[char]) -> String {
    match s.find(|c| stops.contains(&c)) {
        Some(idx) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

fn host_from_url(s: &str) -> Option<String> {
    let without_scheme = s.strip_prefix("https://").or_else(|| s.strip_prefix("http://")).unwrap_or(s);
    let host = without_scheme.split(['/', '?', '#']).next()?;
    let host = host.split(':').next()?;
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

fn looks_like_ip(s: &str) -> bool {
    s.parse::<std::net::IpAddr>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hosts_format_takes_second_token() {
        assert_eq!(parse_line("0.0.0.0 ads.example.com"), Some("ads.example.com".to_string()));
    }

    #[test]
    fn bare_domain_takes_first_token() {
        assert_eq!(parse_line("tracker.example.org"), Some("tracker.example.org".to_string()));
    }

    #[test]
    fn adblock_strips_wildcard_and_stops_at_caret() {
        assert_eq!(parse_line("||tracker.example.org^"), Some("tracker.example.org".to_string()));
        assert_eq!(parse_line("||*.ads.example.com^"), Some("ads.example.com".to_string()));
    }

    #[test]
    fn url_form_extracts_host() {
        assert_eq!(
            parse_line("https://ads.example.com/path?x=1"),
            Some("ads.example.com".to_string())
        );
        assert_eq!(parse_line("|http://tracker.example.org/"), Some("tracker.example.org".to_string()));
    }

    #[test]
    fn rejects_exceptions_cosmetics_and_localhost() {
        assert_eq!(parse_line("@@||example.com^"), None);
        assert_eq!(parse_line("##.ad-banner"), None);
        assert_eq!(parse_line("||localhost^"), None);
        assert_eq!(parse_line("0.0.0.0 localhost"), None);
    }

    #[test]
    fn comments_and_blank_lines_produce_nothing() {
        assert_eq!(parse_line("# a comment"), None);
        assert_eq!(parse_line("! also a comment"), None);
        assert_eq!(parse_line("   "), None);
    }

    #[test]
    fn sample_body_matches_spec_scenario_s7() {
        let body = "# c\n0.0.0.0 ads.example.com\n||tracker.example.org^\n||localhost^\n";
        let domains = parse_body(body);
        assert_eq!(domains, vec!["ads.example.com", "tracker.example.org"]);
    }

    #[test]
    fn oversized_body_is_rejected() {
        let huge = "a".repeat(26 * 1024 * 1024);
        assert!(check_download_size(&huge).is_err());
        assert!(check_download_size("small").is_ok());
    }
}
