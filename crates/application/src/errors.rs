use sentinel_domain::DomainError;
use thiserror::Error;

/// Application-layer error taxonomy (spec §7). Each variant carries a
/// stable string code via `as_code` so the `api` crate can map it to an
/// HTTP status without re-deriving the mapping.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already configured: {0}")]
    AlreadyConfigured(String),

    #[error("blocklist already exists: {0}")]
    BlocklistExists(String),

    #[error("refresh failed: {0}")]
    RefreshFailed(String),

    #[error("follower is read-only")]
    FollowerReadOnly,

    #[error("join code expired")]
    JoinCodeExpired,

    #[error("cluster PSK is not configured")]
    ClusterPskMissing,

    #[error("secrets key is not configured")]
    SecretsKeyMissing,

    #[error("request timestamp skew or replayed nonce")]
    TimestampSkewOrReplay,

    #[error("database error: {0}")]
    Database(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn as_code(&self) -> &'static str {
        match self {
            AppError::Domain(_) | AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::AlreadyConfigured(_) => "ALREADY_CONFIGURED",
            AppError::BlocklistExists(_) => "BLOCKLIST_EXISTS",
            AppError::RefreshFailed(_) => "REFRESH_FAILED",
            AppError::FollowerReadOnly => "FOLLOWER_READONLY",
            AppError::JoinCodeExpired => "JOIN_CODE_EXPIRED",
            AppError::ClusterPskMissing => "CLUSTER_PSK_MISSING",
            AppError::SecretsKeyMissing => "SECRETS_KEY_MISSING",
            AppError::TimestampSkewOrReplay => "TS_SKEW",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Upstream(_) => "UPSTREAM_ERROR",
        }
    }

    /// HTTP status this error maps to at the admin surface (spec §7
    /// "Propagation").
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Domain(_) | AppError::InvalidInput(_) | AppError::JoinCodeExpired => 400,
            AppError::TimestampSkewOrReplay => 401,
            AppError::NotFound(_) => 404,
            AppError::AlreadyConfigured(_)
            | AppError::BlocklistExists(_)
            | AppError::FollowerReadOnly
            | AppError::ClusterPskMissing
            | AppError::SecretsKeyMissing => 409,
            AppError::Database(_) | AppError::RefreshFailed(_) => 500,
            AppError::Upstream(_) => 502,
        }
    }
}
