use crate::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sentinel_application::role_resolver::rejects_as_readonly;
use serde_json::json;

/// `GET`/`HEAD`/`OPTIONS` never mutate state, so the read-only guard
/// (spec §4.4) never needs to block them.
pub fn is_read_only_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Constant-time comparison so a timing side-channel can't leak the
/// admin key one byte at a time (spec §4.5 "constant-time verification"
/// pattern, reused here for bearer-token comparison).
pub fn timing_safe_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.len() == b.len() && a.ct_eq(b).into()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    (status, Json(json!({ "code": code, "message": message }))).into_response()
}

/// Requires `Authorization: Bearer <key>` matching the configured admin
/// key on every request (the minimal ambient auth this surface carries;
/// full session/login storage is explicitly out of scope).
pub async fn require_api_key(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let provided = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(key) if timing_safe_eq(key.as_bytes(), state.api_key.as_bytes()) => next.run(request).await,
        _ => error_response(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "missing or invalid admin key"),
    }
}

/// Rejects mutating requests with `FOLLOWER_READONLY` while this node is
/// a configured follower (spec §4.4 "Read-only guard"), except for the
/// allowlisted paths `role_resolver` already knows about.
pub async fn readonly_guard(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    if is_read_only_method(request.method()) {
        return next.run(request).await;
    }

    let cluster = state.cluster_config().await;
    let path = request.uri().path();
    if rejects_as_readonly(cluster.role, cluster.enabled, path) {
        return error_response(StatusCode::CONFLICT, "FOLLOWER_READONLY", "this node is a read-only follower");
    }

    next.run(request).await
}
