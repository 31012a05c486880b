use crate::handlers::{blocklists, cache, clients, cluster, health, hostname, query_logs, rewrites, rules, settings};
use crate::middleware::{readonly_guard, require_api_key};
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::{middleware, Router};

/// Wires every admin-surface route (spec §6). `/api/health` and the
/// cluster-internal `/api/cluster/sync/export` endpoint skip the admin
/// bearer-key check: health is a liveness probe, sync/export carries its
/// own HMAC authentication instead.
pub fn create_api_routes(state: AppState) -> Router {
    let open = Router::new()
        .route("/health", get(health::health_check))
        .route("/hostname", get(hostname::get_hostname))
        .route("/cluster/sync/export", post(cluster::sync_export));

    let admin = Router::new()
        .route("/rules", get(rules::list_rules).post(rules::create_rule))
        .route("/rules/{id}", axum::routing::delete(rules::delete_rule))
        .route("/blocklists", get(blocklists::list_blocklists).post(blocklists::create_blocklist))
        .route("/blocklists/{id}", put(blocklists::update_blocklist).delete(blocklists::delete_blocklist))
        .route("/blocklists/{id}/refresh", post(blocklists::refresh_blocklist_handler))
        .route("/clients", get(clients::list_clients))
        .route(
            "/clients/{id}",
            get(clients::get_client).put(clients::put_client).delete(clients::delete_client),
        )
        .route("/dns/rewrites", get(rewrites::list_rewrites).post(rewrites::create_rewrite))
        .route("/dns/rewrites/{id}", put(rewrites::update_rewrite).delete(rewrites::delete_rewrite))
        .route("/dns/settings", get(settings::get_dns_settings).put(settings::put_dns_settings))
        .route("/protection/pause", get(settings::get_protection_pause).put(settings::put_protection_pause))
        .route("/settings", get(settings::list_settings))
        .route("/settings/{key}", get(settings::get_setting).put(settings::put_setting))
        .route("/query-logs", get(query_logs::list_query_logs))
        .route("/query-logs/ingest", post(query_logs::ingest_query_logs))
        .route("/query-logs/flush", post(query_logs::flush_query_logs))
        .route("/cluster/status", get(cluster::status))
        .route("/cluster/ready", get(cluster::ready))
        .route("/cluster/peer-status", get(cluster::peer_status))
        .route("/cluster/netinfo", get(cluster::net_info))
        .route("/cluster/join-code", get(cluster::join_code))
        .route("/cluster/enable-leader", post(cluster::enable_leader))
        .route("/cluster/configure-follower", post(cluster::configure_follower))
        .route("/cluster/ha/config", get(cluster::get_ha_config).put(cluster::put_ha_config))
        .route("/cache/stats", get(cache::cache_stats))
        .layer(middleware::from_fn_with_state(state.clone(), readonly_guard))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    open.merge(admin).with_state(state)
}
