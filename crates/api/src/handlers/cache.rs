use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use sentinel_application::ports::CacheStatsSnapshot;
use tracing::instrument;

#[instrument(skip(state), name = "api_cache_stats")]
pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsSnapshot> {
    Json(state.response_cache.stats())
}
