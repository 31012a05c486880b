use crate::dto::{CreateRuleRequest, RuleResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sentinel_application::AppError;
use tracing::instrument;

#[instrument(skip(state), name = "api_list_rules")]
pub async fn list_rules(State(state): State<AppState>) -> ApiResult<Json<Vec<RuleResponse>>> {
    let rules = state.rules.list().await?;
    Ok(Json(rules.iter().map(RuleResponse::from).collect()))
}

#[instrument(skip(state, body), name = "api_create_rule")]
pub async fn create_rule(State(state): State<AppState>, Json(body): Json<CreateRuleRequest>) -> ApiResult<Json<RuleResponse>> {
    let rule = body.into_rule().map_err(|e| ApiError(AppError::InvalidInput(e)))?;
    let created = state.rules.create(rule).await?;
    Ok(Json(RuleResponse::from(&created)))
}

#[instrument(skip(state), name = "api_delete_rule")]
pub async fn delete_rule(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.rules.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
