use serde::{Deserialize, Serialize};

/// Secret-store key source and scrypt parameters (spec §4.5 "Secret
/// store", "Password hashing").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecretsConfig {
    /// Raw key material from `SENTINEL_SECRETS_KEY`. `None` until an admin
    /// sets it; reads of already-stored secrets still work via legacy
    /// plaintext fallback, but writes fail with `SecretsKeyMissing`.
    #[serde(skip)]
    pub secrets_key: Option<String>,

    #[serde(default = "default_scrypt_log_n")]
    pub scrypt_log_n: u8,

    #[serde(default = "default_scrypt_r")]
    pub scrypt_r: u32,

    #[serde(default = "default_scrypt_p")]
    pub scrypt_p: u32,

    #[serde(default = "default_scrypt_output_len")]
    pub scrypt_output_len: usize,
}

fn default_scrypt_log_n() -> u8 {
    14 // N = 2^14 = 16384
}

fn default_scrypt_r() -> u32 {
    8
}

fn default_scrypt_p() -> u32 {
    1
}

fn default_scrypt_output_len() -> usize {
    32
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            secrets_key: None,
            scrypt_log_n: default_scrypt_log_n(),
            scrypt_r: default_scrypt_r(),
            scrypt_p: default_scrypt_p(),
            scrypt_output_len: default_scrypt_output_len(),
        }
    }
}
