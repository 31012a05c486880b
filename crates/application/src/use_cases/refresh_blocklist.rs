use crate::blocklist_parser::{check_download_size, parse_body};
use crate::errors::AppError;
use crate::ports::{BlocklistFetcher, BlocklistRepository};
use tracing::{info, instrument, warn};

/// C3's single refresh operation: download, parse, and atomically
/// replace the rules for one blocklist (spec §4.3). Errors are recorded
/// on the blocklist row rather than propagated raw, matching spec §7
/// "Background jobs never crash the process: blocklist refresh ...
/// record lastError and continue."
#[instrument(skip(fetcher, repo, url))]
pub async fn refresh_blocklist(
    fetcher: &dyn BlocklistFetcher,
    repo: &dyn BlocklistRepository,
    blocklist_id: i64,
    url: &str,
) -> Result<usize, AppError> {
    let result = run(fetcher, repo, blocklist_id, url).await;
    match &result {
        Ok(count) => info!(blocklist_id, count, "blocklist refreshed"),
        Err(err) => {
            warn!(blocklist_id, %err, "blocklist refresh failed");
            // Best-effort: a failure recording the error must not mask the
            // original refresh failure returned to the caller.
            let _ = repo.record_refresh_error(blocklist_id, &err.to_string()).await;
        }
    }
    result
}

async fn run(
    fetcher: &dyn BlocklistFetcher,
    repo: &dyn BlocklistRepository,
    blocklist_id: i64,
    url: &str,
) -> Result<usize, AppError> {
    let body = fetcher.fetch(url).await?;
    check_download_size(&body).map_err(|e| AppError::RefreshFailed(e.to_string()))?;
    let domains = parse_body(&body);
    repo.replace_rules(blocklist_id, &domains).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_domain::Blocklist;
    use std::sync::Mutex;

    struct FakeFetcher {
        body: String,
    }

    #[async_trait]
    impl BlocklistFetcher for FakeFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, AppError> {
            Ok(self.body.clone())
        }
    }

    #[derive(Default)]
    struct FakeRepo {
        last_error: Mutex<Option<String>>,
        last_domains: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlocklistRepository for FakeRepo {
        async fn create(&self, b: Blocklist) -> Result<Blocklist, AppError> {
            Ok(b)
        }
        async fn get_by_id(&self, _id: i64) -> Result<Option<Blocklist>, AppError> {
            Ok(None)
        }
        async fn get_all(&self) -> Result<Vec<Blocklist>, AppError> {
            Ok(Vec::new())
        }
        async fn update(&self, b: Blocklist) -> Result<Blocklist, AppError> {
            Ok(b)
        }
        async fn delete(&self, _id: i64) -> Result<(), AppError> {
            Ok(())
        }
        async fn url_exists(&self, _url: &str) -> Result<bool, AppError> {
            Ok(false)
        }
        async fn replace_rules(&self, _blocklist_id: i64, domains: &[String]) -> Result<usize, AppError> {
            *self.last_domains.lock().unwrap() = domains.to_vec();
            Ok(domains.len())
        }
        async fn record_refresh_error(&self, _blocklist_id: i64, message: &str) -> Result<(), AppError> {
            *self.last_error.lock().unwrap() = Some(message.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn parses_and_replaces_rules() {
        let fetcher = FakeFetcher {
            body: "0.0.0.0 ads.example.com\n||tracker.example.org^\n".to_string(),
        };
        let repo = FakeRepo::default();
        let count = refresh_blocklist(&fetcher, &repo, 1, "https://example.com/list.txt")
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(
            *repo.last_domains.lock().unwrap(),
            vec!["ads.example.com".to_string(), "tracker.example.org".to_string()]
        );
        assert!(repo.last_error.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_body_records_error() {
        let fetcher = FakeFetcher {
            body: "a".repeat(26 * 1024 * 1024),
        };
        let repo = FakeRepo::default();
        let result = refresh_blocklist(&fetcher, &repo, 1, "https://example.com/list.txt").await;
        assert!(result.is_err());
        assert!(repo.last_error.lock().unwrap().is_some());
    }
}
