use crate::dto::{PutRewriteRequest, RewriteResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel_application::AppError;
use tracing::instrument;

#[instrument(skip(state), name = "api_list_rewrites")]
pub async fn list_rewrites(State(state): State<AppState>) -> ApiResult<Json<Vec<RewriteResponse>>> {
    let rewrites = state.rewrites.list().await?;
    Ok(Json(rewrites.iter().map(RewriteResponse::from).collect()))
}

#[instrument(skip(state, body), name = "api_create_rewrite")]
pub async fn create_rewrite(State(state): State<AppState>, Json(body): Json<PutRewriteRequest>) -> ApiResult<Json<RewriteResponse>> {
    let rewrite = body.into_rewrite(None).map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let saved = state.rewrites.upsert(rewrite).await?;
    Ok(Json(RewriteResponse::from(&saved)))
}

#[instrument(skip(state, body), name = "api_update_rewrite")]
pub async fn update_rewrite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PutRewriteRequest>,
) -> ApiResult<Json<RewriteResponse>> {
    let rewrite = body.into_rewrite(Some(id)).map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let saved = state.rewrites.upsert(rewrite).await?;
    Ok(Json(RewriteResponse::from(&saved)))
}

#[instrument(skip(state), name = "api_delete_rewrite")]
pub async fn delete_rewrite(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.rewrites.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
