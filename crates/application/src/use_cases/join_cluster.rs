use crate::errors::AppError;
use chrono::{DateTime, Utc};
use sentinel_domain::JoinCode;

/// Validate and decode a join code offered to `POST
/// /api/cluster/configure-follower` (spec §4.4 "Join code"). `ttl_minutes`
/// comes from `cluster.join_code_ttl_minutes` (default 60) so operators can
/// tune it without a rebuild.
pub fn accept_join_code(encoded: &str, now: DateTime<Utc>, ttl_minutes: i64) -> Result<JoinCode, AppError> {
    let code = JoinCode::decode(encoded)?;
    if code.is_expired(now, chrono::Duration::minutes(ttl_minutes)) {
        return Err(AppError::JoinCodeExpired);
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_code_is_accepted() {
        let code = JoinCode::new("https://leader.local", "psk-value");
        let encoded = code.encode();
        assert!(accept_join_code(&encoded, Utc::now(), 60).is_ok());
    }

    #[test]
    fn backdated_code_is_rejected_as_expired() {
        let mut code = JoinCode::new("https://leader.local", "psk-value");
        code.created_at = Utc::now() - chrono::Duration::minutes(61);
        let encoded = code.encode();
        match accept_join_code(&encoded, Utc::now(), 60) {
            Err(AppError::JoinCodeExpired) => {}
            other => panic!("expected JoinCodeExpired, got {other:?}"),
        }
    }

    #[test]
    fn custom_ttl_is_honored() {
        let mut code = JoinCode::new("https://leader.local", "psk-value");
        code.created_at = Utc::now() - chrono::Duration::minutes(10);
        let encoded = code.encode();
        // Expired under a 5-minute TTL even though the default 60 would accept it.
        match accept_join_code(&encoded, Utc::now(), 5) {
            Err(AppError::JoinCodeExpired) => {}
            other => panic!("expected JoinCodeExpired, got {other:?}"),
        }
        assert!(accept_join_code(&encoded, Utc::now(), 15).is_ok());
    }

    #[test]
    fn malformed_code_is_rejected_as_domain_error() {
        assert!(matches!(accept_join_code("not-valid", Utc::now(), 60), Err(AppError::Domain(_))));
    }
}
