use async_trait::async_trait;
use futures::StreamExt;
use sentinel_application::ports::BlocklistFetcher;
use sentinel_application::AppError;
use std::time::Duration;
use tracing::{error, instrument};

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_DOWNLOAD_BYTES: usize = 25 * 1024 * 1024;

/// HTTP download step of C3 (spec §4.3 "Download"). Streams the body so
/// the 25 MiB cap is enforced without ever buffering an oversized
/// response in full.
pub struct ReqwestBlocklistFetcher {
    client: reqwest::Client,
}

impl ReqwestBlocklistFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .expect("reqwest client with static config always builds");
        Self { client }
    }
}

impl Default for ReqwestBlocklistFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlocklistFetcher for ReqwestBlocklistFetcher {
    #[instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!(error = %e, url, "blocklist download failed");
            AppError::Upstream(e.to_string())
        })?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("blocklist download returned HTTP {}", response.status())));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::Upstream(e.to_string()))?;
            if body.len() + chunk.len() > MAX_DOWNLOAD_BYTES {
                return Err(AppError::Upstream(format!("blocklist body exceeds {MAX_DOWNLOAD_BYTES} bytes")));
            }
            body.extend_from_slice(&chunk);
        }

        String::from_utf8(body).map_err(|e| AppError::Upstream(format!("blocklist body is not valid utf-8: {e}")))
    }
}
