use crate::dto::{BlocklistResponse, CreateBlocklistRequest, UpdateBlocklistRequest};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel_application::use_cases::refresh_blocklist;
use sentinel_application::AppError;
use tracing::instrument;

#[instrument(skip(state), name = "api_list_blocklists")]
pub async fn list_blocklists(State(state): State<AppState>) -> ApiResult<Json<Vec<BlocklistResponse>>> {
    let blocklists = state.blocklists.get_all().await?;
    Ok(Json(blocklists.iter().map(BlocklistResponse::from).collect()))
}

#[instrument(skip(state, body), name = "api_create_blocklist")]
pub async fn create_blocklist(
    State(state): State<AppState>,
    Json(body): Json<CreateBlocklistRequest>,
) -> ApiResult<Json<BlocklistResponse>> {
    if state.blocklists.url_exists(&body.url).await? {
        return Err(ApiError(AppError::BlocklistExists(body.url)));
    }
    let blocklist = body.into_blocklist().map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let created = state.blocklists.create(blocklist).await?;
    Ok(Json(BlocklistResponse::from(&created)))
}

#[instrument(skip(state, body), name = "api_update_blocklist")]
pub async fn update_blocklist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateBlocklistRequest>,
) -> ApiResult<Json<BlocklistResponse>> {
    let existing = state
        .blocklists
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("blocklist {id}"))))?;
    let updated = body.apply(existing).map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let saved = state.blocklists.update(updated).await?;
    Ok(Json(BlocklistResponse::from(&saved)))
}

#[instrument(skip(state), name = "api_delete_blocklist")]
pub async fn delete_blocklist(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.blocklists.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state), name = "api_refresh_blocklist")]
pub async fn refresh_blocklist_handler(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<BlocklistResponse>> {
    let blocklist = state
        .blocklists
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("blocklist {id}"))))?;
    refresh_blocklist(state.blocklist_fetcher.as_ref(), state.blocklists.as_ref(), id, &blocklist.url).await?;
    let refreshed = state
        .blocklists
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("blocklist {id}"))))?;
    Ok(Json(BlocklistResponse::from(&refreshed)))
}
