use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shared::AppError;

/// API error wrapper producing the response envelope:
/// `{ success: false, message, reason }`.
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let reason = self.0.error_code();
        let message = match &self.0 {
            // Domain messages are user-facing prose; pass them through as-is.
            AppError::Domain(e) => e.to_string(),
            other => other.to_string(),
        };

        // Log internal errors
        if status.is_server_error() {
            tracing::error!("Internal error: {:?}", self.0);
        }

        let body = json!({
            "success": false,
            "message": message,
            "reason": reason,
        });

        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<shared::DomainError> for ApiError {
    fn from(err: shared::DomainError) -> Self {
        Self(AppError::Domain(err))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self(AppError::from(err))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
