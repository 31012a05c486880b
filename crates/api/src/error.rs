use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sentinel_application::AppError;
use serde::Serialize;

/// Wraps `AppError` for the admin surface, mapping it to the status codes
/// and stable `code` strings spec §7 "Propagation" requires.
pub struct ApiError(pub AppError);

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorBody {
            code: self.0.as_code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
