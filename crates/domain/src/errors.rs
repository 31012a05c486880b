use thiserror::Error;

/// Errors raised while constructing or validating a domain entity.
///
/// Kept separate from `application::AppError`: this type never knows about
/// HTTP statuses or the error-code taxonomy, only about invariants the
/// entities themselves enforce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid rule scope encoding: {0}")]
    InvalidRuleScope(String),

    #[error("invalid client profile: {0}")]
    InvalidClientProfile(String),

    #[error("invalid settings value for key {0}: {1}")]
    InvalidSettingsValue(String, String),

    #[error("invalid join code: {0}")]
    InvalidJoinCode(String),
}
