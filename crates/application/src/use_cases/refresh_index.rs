use crate::errors::AppError;
use crate::policy::{IndexBuilder, PolicyEngine};
use crate::ports::{BlocklistRow, PolicyDataPort};
use tracing::{info, instrument};

/// Rebuilds the `Index` from `data` and publishes it onto `engine` (spec
/// §4.2 "Refresh cadence: periodic (~5 s)"). The jobs crate wraps this in
/// a ticker with a coalescing cooldown; this use case itself is a single
/// synchronous-from-the-caller's-view rebuild.
#[instrument(skip_all)]
pub async fn refresh_index(data: &dyn PolicyDataPort, engine: &PolicyEngine) -> Result<(), AppError> {
    let rules = data.load_rules().await?;
    let clients = data.load_clients().await?;
    let blocklist_rows = data.load_blocklists().await?;
    let rewrites = data.load_rewrites().await?;
    let protection_pause = data.load_protection_pause().await?;

    let rule_count = rules.len();
    let client_count = clients.len();
    let blocklist_count = blocklist_rows.len();

    let blocklists = blocklist_rows
        .into_iter()
        .map(|row| (row.id, to_meta(row)))
        .collect();

    let index = IndexBuilder::new()
        .with_rules(rules)
        .with_clients(clients)
        .with_blocklists(blocklists)
        .with_rewrites(rewrites)
        .with_protection_pause(protection_pause)
        .build();

    engine.publish(index);
    info!(rule_count, client_count, blocklist_count, "index refreshed");
    Ok(())
}

fn to_meta(row: BlocklistRow) -> crate::policy::BlocklistMeta {
    crate::policy::BlocklistMeta {
        enabled: row.enabled,
        mode: row.mode,
        name: row.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_domain::{ClientProfile, DnsRewrite, ProtectionPause, Rule, RuleScope, RuleType};
    use std::sync::Arc;

    struct FakeData {
        rules: Vec<Rule>,
    }

    #[async_trait]
    impl PolicyDataPort for FakeData {
        async fn load_rules(&self) -> Result<Vec<Rule>, AppError> {
            Ok(self.rules.clone())
        }
        async fn load_clients(&self) -> Result<Vec<Arc<ClientProfile>>, AppError> {
            Ok(Vec::new())
        }
        async fn load_blocklists(&self) -> Result<Vec<BlocklistRow>, AppError> {
            Ok(Vec::new())
        }
        async fn load_rewrites(&self) -> Result<Vec<DnsRewrite>, AppError> {
            Ok(Vec::new())
        }
        async fn load_protection_pause(&self) -> Result<ProtectionPause, AppError> {
            Ok(ProtectionPause::default())
        }
    }

    #[tokio::test]
    async fn refresh_publishes_loaded_rules() {
        let data = FakeData {
            rules: vec![Rule::new("blocked.test", RuleType::Blocked, RuleScope::Manual)],
        };
        let engine = PolicyEngine::new(IndexBuilder::new().build());
        refresh_index(&data, &engine).await.unwrap();

        let decision = engine.decide(
            "blocked.test",
            "127.0.0.1".parse().unwrap(),
            chrono::Utc::now(),
        );
        assert!(decision.is_hard_block());
    }
}
