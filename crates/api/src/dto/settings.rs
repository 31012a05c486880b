use serde::{Deserialize, Serialize};

/// `PUT /api/settings/:key` body: an arbitrary JSON value stored verbatim
/// under the generic `settings` table (spec §3 "Settings singletons").
#[derive(Debug, Deserialize)]
pub struct PutRawSettingRequest {
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct RawSettingResponse {
    pub key: String,
    pub value: serde_json::Value,
}
