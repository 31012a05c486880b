use crate::dto::{PutRawSettingRequest, RawSettingResponse};
use crate::error::ApiResult;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use sentinel_domain::{DnsForwardSettings, ProtectionPause};
use tracing::instrument;

#[instrument(skip(state), name = "api_get_dns_settings")]
pub async fn get_dns_settings(State(state): State<AppState>) -> ApiResult<Json<DnsForwardSettings>> {
    Ok(Json(state.settings.get_dns_settings().await?))
}

#[instrument(skip(state, body), name = "api_put_dns_settings")]
pub async fn put_dns_settings(State(state): State<AppState>, Json(body): Json<DnsForwardSettings>) -> ApiResult<Json<DnsForwardSettings>> {
    state.settings.put_dns_settings(body).await?;
    Ok(Json(state.settings.get_dns_settings().await?))
}

#[instrument(skip(state), name = "api_get_protection_pause")]
pub async fn get_protection_pause(State(state): State<AppState>) -> ApiResult<Json<ProtectionPause>> {
    Ok(Json(state.settings.get_protection_pause().await?))
}

#[instrument(skip(state, body), name = "api_put_protection_pause")]
pub async fn put_protection_pause(State(state): State<AppState>, Json(body): Json<ProtectionPause>) -> ApiResult<Json<ProtectionPause>> {
    state.settings.put_protection_pause(body).await?;
    Ok(Json(state.settings.get_protection_pause().await?))
}

#[instrument(skip(state), name = "api_list_settings")]
pub async fn list_settings(State(state): State<AppState>) -> ApiResult<Json<Vec<RawSettingResponse>>> {
    let rows = state.settings.list_raw().await?;
    Ok(Json(
        rows.into_iter().map(|(key, value)| RawSettingResponse { key, value }).collect(),
    ))
}

#[instrument(skip(state), name = "api_get_setting")]
pub async fn get_setting(State(state): State<AppState>, Path(key): Path<String>) -> ApiResult<Json<Option<serde_json::Value>>> {
    Ok(Json(state.settings.get_raw(&key).await?))
}

#[instrument(skip(state, body), name = "api_put_setting")]
pub async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(body): Json<PutRawSettingRequest>,
) -> ApiResult<Json<RawSettingResponse>> {
    state.settings.put_raw(&key, body.value.clone()).await?;
    Ok(Json(RawSettingResponse { key, value: body.value }))
}
