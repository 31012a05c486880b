use crate::dto::{ClientResponse, PutClientRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel_application::AppError;
use tracing::instrument;

#[instrument(skip(state), name = "api_list_clients")]
pub async fn list_clients(State(state): State<AppState>) -> ApiResult<Json<Vec<ClientResponse>>> {
    let clients = state.clients.list().await?;
    Ok(Json(clients.iter().map(|c| ClientResponse::from(c.as_ref())).collect()))
}

#[instrument(skip(state), name = "api_get_client")]
pub async fn get_client(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<ClientResponse>> {
    let client = state
        .clients
        .get(id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("client {id}"))))?;
    Ok(Json(ClientResponse::from(client.as_ref())))
}

#[instrument(skip(state, body), name = "api_put_client")]
pub async fn put_client(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PutClientRequest>,
) -> ApiResult<Json<ClientResponse>> {
    let profile = body.into_profile(id).map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let saved = state.clients.upsert(profile).await?;
    Ok(Json(ClientResponse::from(&saved)))
}

#[instrument(skip(state), name = "api_delete_client")]
pub async fn delete_client(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.clients.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
