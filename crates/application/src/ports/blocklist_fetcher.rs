use crate::errors::AppError;
use async_trait::async_trait;

/// HTTP download step of C3 (spec §4.3 "Download"). Kept separate from
/// parsing so the parser stays a pure function over `&str` lines.
#[async_trait]
pub trait BlocklistFetcher: Send + Sync {
    /// GET `url` with a 15 s timeout and a 25 MiB hard byte cap, streamed
    /// line-by-line. `AppError::Upstream` on overflow, network error or
    /// non-2xx status.
    async fn fetch(&self, url: &str) -> Result<String, AppError>;
}
