use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;
use scrypt::{scrypt, Params};
use sentinel_application::ports::SecretStore;
use sentinel_application::AppError;
use sqlx::SqlitePool;
use subtle::ConstantTimeEq;
use tracing::{error, instrument};

const SCRYPT_LOG_N: u8 = 14; // N = 16384
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const KEY_LEN: usize = 32;

/// Domain-separation salt for deriving the AES key from `SECRETS_KEY`
/// (spec §4.5 "`SECRETS_KEY` derives an AES-256-GCM key (scrypt)"). A
/// fixed salt is acceptable here: `SECRETS_KEY` itself is the
/// high-entropy secret, this salt only separates the derivation from
/// other scrypt uses in the process (e.g. password hashing, which uses
/// its own random salt per call).
const KEY_DERIVATION_SALT: &[u8] = b"sentinel-secrets-key-v1";

fn derive_aes_key(secrets_key: &str) -> [u8; KEY_LEN] {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).expect("static scrypt params are valid");
    let mut out = [0u8; KEY_LEN];
    scrypt(secrets_key.as_bytes(), KEY_DERIVATION_SALT, &params, &mut out).expect("scrypt derivation cannot fail for valid params/output length");
    out
}

/// `secret:<name>` storage backed by the `settings` table, encrypted with
/// AES-256-GCM under a key derived from `SECRETS_KEY` (spec §4.5 "Secret
/// store"). Constructed without a key when `SECRETS_KEY` is unset; reads
/// still work for legacy plaintext rows, writes fail with
/// `SecretsKeyMissing`.
pub struct SqliteSecretStore {
    pool: SqlitePool,
    aes_key: Option<[u8; KEY_LEN]>,
}

impl SqliteSecretStore {
    pub fn new(pool: SqlitePool, secrets_key: Option<&str>) -> Self {
        Self {
            pool,
            aes_key: secrets_key.map(derive_aes_key),
        }
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let key_bytes = self.aes_key.ok_or(AppError::SecretsKeyMissing)?;
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

        let mut nonce_bytes = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| AppError::Database("secret encryption failed".to_string()))?;

        let mut payload = Vec::with_capacity(nonce_bytes.len() + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(format!("enc:{}", BASE64_STANDARD.encode(payload)))
    }

    /// Decrypt a `enc:<base64>` blob, or pass through a legacy plaintext
    /// value unchanged (spec §4.5 "tolerates legacy plaintext strings").
    /// Any shape mismatch or auth failure yields `""`, never an error.
    fn decrypt(&self, stored: &str) -> String {
        let Some(encoded) = stored.strip_prefix("enc:") else {
            return stored.to_string();
        };
        let Some(key_bytes) = self.aes_key else {
            return String::new();
        };
        let Ok(payload) = BASE64_STANDARD.decode(encoded) else {
            return String::new();
        };
        if payload.len() < 12 {
            return String::new();
        }
        let (nonce_bytes, ciphertext) = payload.split_at(12);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SecretStore for SqliteSecretStore {
    #[instrument(skip(self, plaintext))]
    async fn set_secret(&self, name: &str, plaintext: &str) -> Result<(), AppError> {
        let encrypted = self.encrypt(plaintext)?;
        let key = format!("secret:{name}");
        sqlx::query(
            "INSERT INTO settings (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&key)
        .bind(serde_json::Value::String(encrypted).to_string())
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!(error = %e, secret = name, "failed to store secret");
            AppError::Database(e.to_string())
        })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_secret(&self, name: &str) -> Result<String, AppError> {
        let key = format!("secret:{name}");
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(&key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let Some((raw,)) = row else {
            return Ok(String::new());
        };
        let stored = serde_json::from_str::<serde_json::Value>(&raw)
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
            .unwrap_or(raw);
        Ok(self.decrypt(&stored))
    }

    fn hash_password(&self, plaintext: &str) -> Result<String, AppError> {
        let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN)
            .map_err(|e| AppError::Database(e.to_string()))?;
        let mut salt = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let mut hash = [0u8; KEY_LEN];
        scrypt(plaintext.as_bytes(), &salt, &params, &mut hash).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(format!(
            "scrypt:{}:{}",
            hex_encode(&salt),
            hex_encode(&hash)
        ))
    }

    fn verify_password(&self, plaintext: &str, stored_hash: &str) -> bool {
        let mut parts = stored_hash.splitn(3, ':');
        let (Some(scheme), Some(salt_hex), Some(hash_hex)) = (parts.next(), parts.next(), parts.next()) else {
            return false;
        };
        if scheme != "scrypt" {
            return false;
        }
        let Some(salt) = hex_decode(salt_hex) else { return false };
        let Some(expected) = hex_decode(hash_hex) else { return false };
        let Ok(params) = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, expected.len()) else {
            return false;
        };
        let mut actual = vec![0u8; expected.len()];
        if scrypt(plaintext.as_bytes(), &salt, &params, &mut actual).is_err() {
            return false;
        }
        if actual.len() != expected.len() {
            return false;
        }
        actual.ct_eq(&expected).into()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(key: Option<&str>) -> SqliteSecretStore {
        SqliteSecretStore {
            pool: unreachable_pool(),
            aes_key: key.map(derive_aes_key),
        }
    }

    fn unreachable_pool() -> SqlitePool {
        // Encryption/hashing tests never touch the pool; this is only to
        // satisfy the struct's shape without spinning up a connection.
        SqlitePool::connect_lazy("sqlite::memory:").expect("lazy connect never touches the network")
    }

    #[test]
    fn encrypt_then_decrypt_roundtrips() {
        let s = store(Some("test-secrets-key"));
        let encrypted = s.encrypt("hunter2").unwrap();
        assert!(encrypted.starts_with("enc:"));
        assert_eq!(s.decrypt(&encrypted), "hunter2");
    }

    #[test]
    fn legacy_plaintext_passes_through() {
        let s = store(Some("test-secrets-key"));
        assert_eq!(s.decrypt("plain-legacy-value"), "plain-legacy-value");
    }

    #[test]
    fn missing_key_fails_encryption() {
        let s = store(None);
        assert!(s.encrypt("whatever").is_err());
    }

    #[test]
    fn password_hash_roundtrip() {
        let s = store(None);
        let hash = s.hash_password("correct horse battery staple").unwrap();
        assert!(s.verify_password("correct horse battery staple", &hash));
        assert!(!s.verify_password("wrong", &hash));
    }

    #[test]
    fn non_scrypt_scheme_never_verifies() {
        let s = store(None);
        assert!(!s.verify_password("anything", "bcrypt:deadbeef:deadbeef"));
    }
}
