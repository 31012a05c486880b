use crate::dto::{IngestQueryLogsRequest, QueryLogResponse, QueryLogsQuery};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel_application::use_cases::retention_sweep;
use sentinel_application::AppError;
use serde::Serialize;
use tracing::instrument;

#[instrument(skip(state), name = "api_list_query_logs")]
pub async fn list_query_logs(State(state): State<AppState>, Query(params): Query<QueryLogsQuery>) -> ApiResult<Json<Vec<QueryLogResponse>>> {
    let since = chrono::Utc::now() - chrono::Duration::hours(params.hours);
    let entries = state
        .query_log
        .query(since, params.domain.as_deref(), params.status.as_deref(), params.limit)
        .await?;
    Ok(Json(entries.iter().map(QueryLogResponse::from).collect()))
}

#[instrument(skip(state, body), name = "api_ingest_query_logs")]
pub async fn ingest_query_logs(State(state): State<AppState>, Json(body): Json<IngestQueryLogsRequest>) -> ApiResult<StatusCode> {
    let entries = body
        .entries
        .into_iter()
        .map(|e| e.into_entry())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    state.query_log.append_batch(entries).await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Serialize)]
pub struct FlushResponse {
    deleted: u64,
}

/// Manually triggers an immediate full sweep, independent of the
/// periodic retention job's schedule (spec §6 `POST /api/query-logs/flush`).
#[instrument(skip(state), name = "api_flush_query_logs")]
pub async fn flush_query_logs(State(state): State<AppState>) -> ApiResult<Json<FlushResponse>> {
    let deleted = retention_sweep(state.query_log.as_ref(), 0, chrono::Utc::now()).await?;
    Ok(Json(FlushResponse { deleted }))
}
