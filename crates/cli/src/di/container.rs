use crate::bootstrap::database::DatabasePools;
use sentinel_api::dto::ClusterConfigRecord;
use sentinel_api::AppState;
use sentinel_application::cluster_auth::NonceCache;
use sentinel_application::policy::{IndexBuilder, PolicyEngine};
use sentinel_application::ports::{PolicyDataPort, UpstreamResolver};
use sentinel_domain::config::Config;
use sentinel_domain::{ClusterRole, ForwardTransport};
use sentinel_infrastructure::blocklist::ReqwestBlocklistFetcher;
use sentinel_infrastructure::cluster::{FileRoleOverrideReader, ReqwestClusterTransport};
use sentinel_infrastructure::dns::upstream::doh::DohUpstreamResolver;
use sentinel_infrastructure::dns::upstream::dot::DotUpstreamResolver;
use sentinel_infrastructure::dns::upstream::tcp::TcpUpstreamResolver;
use sentinel_infrastructure::dns::upstream::udp::UdpUpstreamResolver;
use sentinel_infrastructure::dns::{DnsServerHandler, ListenerConfig, ResponseCache};
use sentinel_infrastructure::repositories::{
    SqliteAdminRepository, SqliteBlocklistRepository, SqliteClusterSnapshotRepository, SqlitePolicyDataRepository,
    SqliteQueryLogRepository,
};
use sentinel_infrastructure::secrets::SqliteSecretStore;
use sentinel_jobs::{BlocklistSyncJob, FollowerSyncJob, IndexRefreshJob, QueryLogRetentionJob};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything the composition root needs to start the DNS listener, the
/// admin HTTP surface and the background jobs (spec §4.5 "Persistence
/// adapter" ties every port to one of the three SQLite pools below).
pub struct Container {
    pub engine: Arc<PolicyEngine>,
    pub admin: Arc<SqliteAdminRepository>,
    pub blocklists: Arc<SqliteBlocklistRepository>,
    pub blocklist_fetcher: Arc<ReqwestBlocklistFetcher>,
    pub query_log: Arc<SqliteQueryLogRepository>,
    pub cluster_snapshot: Arc<SqliteClusterSnapshotRepository>,
    pub cluster_transport: Arc<ReqwestClusterTransport>,
    pub role_override: Arc<FileRoleOverrideReader>,
    pub secrets: Arc<SqliteSecretStore>,
    pub nonces: Arc<NonceCache>,
    pub policy_data: Arc<SqlitePolicyDataRepository>,
    pub last_sync: Arc<Mutex<Option<chrono::DateTime<chrono::Utc>>>>,
}

impl Container {
    pub async fn build(config: &Config, pools: &DatabasePools) -> anyhow::Result<Self> {
        let admin = Arc::new(SqliteAdminRepository::new(pools.write.clone()));
        let blocklists = Arc::new(SqliteBlocklistRepository::new(pools.write.clone()));
        let blocklist_fetcher = Arc::new(ReqwestBlocklistFetcher::new());
        let query_log = Arc::new(SqliteQueryLogRepository::new(pools.query_log.clone()));
        let cluster_snapshot = Arc::new(SqliteClusterSnapshotRepository::new(pools.read.clone(), pools.write.clone()));
        let cluster_transport = Arc::new(ReqwestClusterTransport::new());
        let role_override = Arc::new(FileRoleOverrideReader::new(config.cluster.role_override_path.clone().into()));
        let secrets = Arc::new(SqliteSecretStore::new(pools.write.clone(), config.secrets.secrets_key.as_deref()));
        let nonces = Arc::new(NonceCache::new());
        let policy_data = Arc::new(SqlitePolicyDataRepository::new(pools.read.clone()));

        let index = IndexBuilder::new().build();
        let engine = Arc::new(PolicyEngine::new(index));
        sentinel_application::use_cases::refresh_index(policy_data.as_ref() as &dyn PolicyDataPort, &engine).await?;

        Ok(Self {
            engine,
            admin,
            blocklists,
            blocklist_fetcher,
            query_log,
            cluster_snapshot,
            cluster_transport,
            role_override,
            secrets,
            nonces,
            policy_data,
            last_sync: Arc::new(Mutex::new(None)),
        })
    }

    /// Reads the `dns_settings` singleton and builds the matching
    /// `UpstreamResolver` plus the process-local response cache (spec
    /// §4.1 "Upstream transport selection", "Response cache"). Only the
    /// first configured upstream server is dialed; failover across
    /// multiple upstreams is a non-goal.
    pub async fn build_upstream(
        &self,
    ) -> anyhow::Result<(Arc<dyn UpstreamResolver>, Arc<dyn sentinel_application::ports::ResponseCachePort>, ListenerConfig)> {
        let settings = sentinel_application::ports::SettingsRepository::get_dns_settings(self.admin.as_ref()).await?;
        let server = settings
            .upstream_servers
            .first()
            .ok_or_else(|| anyhow::anyhow!("dns_settings.upstream_servers is empty"))?
            .clone();
        let timeout_ms = settings.transport.default_timeout_ms();

        let resolver: Arc<dyn UpstreamResolver> = match settings.transport {
            ForwardTransport::Udp => {
                let addr: SocketAddr = server.parse()?;
                Arc::new(UdpUpstreamResolver::new(addr))
            }
            ForwardTransport::Tcp => {
                let addr: SocketAddr = server.parse()?;
                Arc::new(TcpUpstreamResolver::new(addr))
            }
            ForwardTransport::Dot => {
                let (host, port) = split_host_port(&server, 853);
                let addr: SocketAddr = format!("{host}:{port}").parse().or_else(|_| resolve_one(&host, port))?;
                Arc::new(DotUpstreamResolver::new(addr, &host)?)
            }
            ForwardTransport::Doh => Arc::new(DohUpstreamResolver::new(server.clone())),
        };

        let config = ListenerConfig {
            upstream_timeout: Duration::from_millis(timeout_ms),
            shadow_resolve_blocked: true,
            synthesized_ttl: 60,
        };

        let cache: Arc<dyn sentinel_application::ports::ResponseCachePort> = if settings.response_cache_enabled {
            Arc::new(ResponseCache::new(settings.response_cache_max_entries))
        } else {
            Arc::new(sentinel_infrastructure::dns::NullResponseCache)
        };

        Ok((resolver, cache, config))
    }

    pub fn build_dns_handler(
        &self,
        upstream: Arc<dyn UpstreamResolver>,
        cache: Arc<dyn sentinel_application::ports::ResponseCachePort>,
        listener_config: ListenerConfig,
    ) -> DnsServerHandler {
        DnsServerHandler::new(self.engine.clone(), upstream, cache, self.query_log.clone(), listener_config)
    }

    /// Reads the stored `cluster_config` record, building a follower sync
    /// job when the stored role is `follower` (spec §4.4 "Follower loop").
    pub async fn build_follower_sync_job(&self, config: &Config) -> anyhow::Result<Option<FollowerSyncJob>> {
        let record: ClusterConfigRecord =
            match sentinel_application::ports::SettingsRepository::get_raw(self.admin.as_ref(), "cluster_config").await? {
                Some(value) => serde_json::from_value(value)?,
                None => return Ok(None),
            };

        if record.role != ClusterRole::Follower {
            return Ok(None);
        }
        let leader_url = match record.leader_url {
            Some(url) => url,
            None => return Ok(None),
        };
        let psk = match sentinel_application::ports::SettingsRepository::get_raw(self.admin.as_ref(), "cluster_psk").await? {
            Some(value) => value.as_str().unwrap_or_default().to_string(),
            None => return Ok(None),
        };

        Ok(Some(
            FollowerSyncJob::new(
                self.cluster_transport.clone(),
                self.cluster_snapshot.clone(),
                self.role_override.clone(),
                record.role,
                leader_url,
                psk,
            )
            .with_interval(config.cluster.follower_sync_interval_secs),
        ))
    }

    pub fn build_index_refresh_job(&self) -> IndexRefreshJob {
        IndexRefreshJob::new(self.policy_data.clone(), self.engine.clone())
    }

    pub fn build_blocklist_sync_job(&self) -> BlocklistSyncJob {
        BlocklistSyncJob::new(self.blocklists.clone(), self.blocklist_fetcher.clone())
    }

    pub fn build_query_log_retention_job(&self, config: &Config) -> QueryLogRetentionJob {
        QueryLogRetentionJob::new(self.query_log.clone(), config.retention.query_log_retention_days)
            .with_interval(config.retention.maintenance_interval_secs)
    }

    /// Assembles the admin HTTP surface's shared state. `api_key` is the
    /// static bearer secret the teacher's config layer loads from
    /// `SENTINEL_API_KEY`/the secrets store at startup.
    pub fn build_app_state(
        &self,
        api_key: Arc<str>,
        response_cache: Arc<dyn sentinel_application::ports::ResponseCachePort>,
        join_code_ttl_minutes: i64,
    ) -> AppState {
        AppState {
            engine: self.engine.clone(),
            rules: self.admin.clone(),
            clients: self.admin.clone(),
            rewrites: self.admin.clone(),
            settings: self.admin.clone(),
            blocklists: self.blocklists.clone(),
            blocklist_fetcher: self.blocklist_fetcher.clone(),
            query_log: self.query_log.clone(),
            cluster_snapshot: self.cluster_snapshot.clone(),
            cluster_transport: self.cluster_transport.clone(),
            role_override: self.role_override.clone(),
            secrets: self.secrets.clone(),
            nonces: self.nonces.clone(),
            last_sync: self.last_sync.clone(),
            response_cache,
            api_key,
            join_code_ttl_minutes,
        }
    }
}

fn split_host_port(server: &str, default_port: u16) -> (String, u16) {
    match server.rsplit_once(':') {
        Some((host, port)) => port.parse().map(|p| (host.to_string(), p)).unwrap_or_else(|_| (server.to_string(), default_port)),
        None => (server.to_string(), default_port),
    }
}

fn resolve_one(host: &str, port: u16) -> Result<SocketAddr, std::io::Error> {
    use std::net::ToSocketAddrs;
    (host, port).to_socket_addrs()?.next().ok_or_else(|| std::io::Error::other(format!("could not resolve {host}")))
}
