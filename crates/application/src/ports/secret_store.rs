use crate::errors::AppError;
use async_trait::async_trait;

/// Encrypted settings-backed secrets (spec §4.5 "Secret store"). The
/// scrypt/AES-256-GCM implementation lives in `infrastructure`; this port
/// only describes the read/write contract and the one invariant callers
/// depend on: a missing key never panics, it fails with
/// `AppError::SecretsKeyMissing` on writes and returns `""` on reads.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Encrypt and persist under `secret:<name>`.
    async fn set_secret(&self, name: &str, plaintext: &str) -> Result<(), AppError>;

    /// Decrypt `secret:<name>`. Tolerates legacy plaintext values stored
    /// before encryption was introduced. Returns `""` on any decode or
    /// auth failure rather than propagating an error (spec §4.5).
    async fn get_secret(&self, name: &str) -> Result<String, AppError>;

    /// `scrypt` password hash for admin-credential storage (spec §4.5
    /// "Password hashing"). Not a `secret:<name>` row.
    fn hash_password(&self, plaintext: &str) -> Result<String, AppError>;

    /// Constant-time verification against a stored hash. `false` for any
    /// malformed stored value or a scheme other than `scrypt`.
    fn verify_password(&self, plaintext: &str, stored_hash: &str) -> bool;
}
