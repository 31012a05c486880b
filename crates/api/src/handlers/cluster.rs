use crate::dto::*;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use rand::RngCore;
use sentinel_application::cluster_auth::SignedRequest;
use sentinel_application::use_cases::{accept_join_code, export_snapshot};
use sentinel_application::AppError;
use sentinel_domain::{ClusterRole, JoinCode};
use tracing::instrument;

const CLUSTER_PSK_KEY: &str = "cluster_psk";
const SYNC_EXPORT_PATH: &str = "/api/cluster/sync/export";

async fn load_psk(state: &AppState) -> Result<String, AppError> {
    match state.settings.get_raw(CLUSTER_PSK_KEY).await? {
        Some(value) => value.as_str().map(str::to_string).ok_or(AppError::ClusterPskMissing),
        None => Err(AppError::ClusterPskMissing),
    }
}

fn generate_psk() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    BASE64_STANDARD.encode(bytes)
}

#[instrument(skip(state), name = "api_cluster_status")]
pub async fn status(State(state): State<AppState>) -> ApiResult<Json<ClusterStatusResponse>> {
    let cluster = state.cluster_config().await;
    Ok(Json(ClusterStatusResponse::from(&cluster)))
}

#[instrument(skip(state), name = "api_cluster_ready")]
pub async fn ready(State(state): State<AppState>) -> ApiResult<Json<ReadyResponse>> {
    let cluster = state.cluster_config().await;
    let effective = state.role_override.read().unwrap_or(cluster.role);
    let last_sync = *state.last_sync.lock().expect("last_sync mutex poisoned");
    let is_ready = sentinel_application::role_resolver::is_ready(cluster.role, effective, last_sync, chrono::Utc::now());
    Ok(Json(ReadyResponse {
        ready: is_ready,
        role: effective,
    }))
}

#[instrument(skip(state), name = "api_cluster_peer_status")]
pub async fn peer_status(State(state): State<AppState>) -> ApiResult<Json<PeerStatusResponse>> {
    let cluster = state.cluster_config().await;
    let last_sync = *state.last_sync.lock().expect("last_sync mutex poisoned");
    Ok(Json(PeerStatusResponse {
        role: cluster.role,
        enabled: cluster.enabled,
        last_sync,
    }))
}

#[instrument(skip(state), name = "api_cluster_net_info")]
pub async fn net_info(State(state): State<AppState>) -> ApiResult<Json<NetInfoResponse>> {
    let cluster = state.cluster_config().await;
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    Ok(Json(NetInfoResponse {
        hostname,
        leader_url: cluster.leader_url,
    }))
}

#[instrument(skip(state, body), name = "api_cluster_enable_leader")]
pub async fn enable_leader(State(state): State<AppState>, Json(body): Json<EnableLeaderRequest>) -> ApiResult<Json<EnableLeaderResponse>> {
    let psk = generate_psk();
    state.settings.put_raw(CLUSTER_PSK_KEY, serde_json::Value::String(psk.clone())).await?;

    let config = ClusterConfigRecord {
        enabled: true,
        role: ClusterRole::Leader,
        leader_url: Some(body.leader_url.clone()),
    };
    state.put_cluster_config(&config).await?;

    let join_code = JoinCode::new(body.leader_url, psk).encode();
    Ok(Json(EnableLeaderResponse { join_code }))
}

#[instrument(skip(state), name = "api_cluster_join_code")]
pub async fn join_code(State(state): State<AppState>) -> ApiResult<Json<JoinCodeResponse>> {
    let cluster = state.cluster_config().await;
    if cluster.role != ClusterRole::Leader {
        return Err(ApiError(AppError::InvalidInput("node is not a cluster leader".to_string())));
    }
    let leader_url = cluster
        .leader_url
        .ok_or_else(|| ApiError(AppError::InvalidInput("leader_url is not configured".to_string())))?;
    let psk = load_psk(&state).await?;
    Ok(Json(JoinCodeResponse {
        join_code: JoinCode::new(leader_url, psk).encode(),
    }))
}

#[instrument(skip(state, body), name = "api_cluster_configure_follower")]
pub async fn configure_follower(State(state): State<AppState>, Json(body): Json<ConfigureFollowerRequest>) -> ApiResult<StatusCode> {
    let code = accept_join_code(&body.join_code, chrono::Utc::now(), state.join_code_ttl_minutes)?;
    state
        .settings
        .put_raw(CLUSTER_PSK_KEY, serde_json::Value::String(code.psk.clone()))
        .await?;

    let config = ClusterConfigRecord {
        enabled: true,
        role: ClusterRole::Follower,
        leader_url: Some(code.leader_url),
    };
    state.put_cluster_config(&config).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state), name = "api_cluster_ha_config_get")]
pub async fn get_ha_config(State(state): State<AppState>) -> ApiResult<Json<ClusterStatusResponse>> {
    let cluster = state.cluster_config().await;
    Ok(Json(ClusterStatusResponse::from(&cluster)))
}

#[instrument(skip(state, body), name = "api_cluster_ha_config_put")]
pub async fn put_ha_config(State(state): State<AppState>, Json(body): Json<ClusterConfigRecord>) -> ApiResult<Json<ClusterStatusResponse>> {
    state.put_cluster_config(&body).await?;
    Ok(Json(ClusterStatusResponse::from(&body)))
}

/// Leader side of `POST /api/cluster/sync/export` (spec §4.4 "Request
/// authentication"). The three auth headers carry what `cluster_auth`
/// needs to verify the signature; the body is the raw bytes actually
/// signed by the caller, not a re-serialized copy.
#[instrument(skip(state, headers, body), name = "api_cluster_sync_export")]
pub async fn sync_export(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> ApiResult<Json<sentinel_application::ports::ClusterSnapshot>> {
    let timestamp_ms = header_str(&headers, "x-sentinel-timestamp")
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or_else(|| ApiError(AppError::TimestampSkewOrReplay))?;
    let nonce = header_str(&headers, "x-sentinel-nonce")
        .ok_or_else(|| ApiError(AppError::TimestampSkewOrReplay))?
        .to_string();
    let signature = header_str(&headers, "x-sentinel-signature")
        .ok_or_else(|| ApiError(AppError::TimestampSkewOrReplay))?
        .to_string();

    let signed_request = SignedRequest {
        method: "POST".to_string(),
        path: SYNC_EXPORT_PATH.to_string(),
        timestamp_ms,
        nonce,
        signature,
        body: body.to_vec(),
    };

    let psk = load_psk(&state).await?;
    let snapshot = export_snapshot(state.cluster_snapshot.as_ref(), &psk, &signed_request, state.nonces.as_ref(), chrono::Utc::now()).await?;
    Ok(Json(snapshot))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
