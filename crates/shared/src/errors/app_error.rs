use super::DomainError;
use thiserror::Error;

/// Application-level errors (includes infrastructure)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Request timeout")]
    Timeout,
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Domain(e) => match e {
                DomainError::RoomNotFound(_) | DomainError::RequestNotFound(_) => 404,
                DomainError::NotAMember
                | DomainError::NotRoomOwner
                | DomainError::NotRequestTarget
                | DomainError::NotRequester => 403,
                DomainError::StaleRequest => 409,
                _ => 400,
            },
            AppError::Database(_) | AppError::Internal(_) => 500,
            AppError::ExternalApi(_) => 503,
            AppError::Unauthorized => 401,
            AppError::Forbidden => 403,
            AppError::NotFound(_) => 404,
            AppError::Validation(_) => 400,
            AppError::Timeout => 504,
        }
    }

    /// Get a machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Domain(e) => e.reason_code(),
            AppError::Database(_) => "database_error",
            AppError::ExternalApi(_) => "external_api_error",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Internal(_) => "internal_error",
            AppError::Timeout => "timeout",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Log the actual error but don't expose details
        tracing::error!("Database error: {:?}", err);
        AppError::Database(err.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Domain(DomainError::RoomNotFound("x".into())).status_code(),
            404
        );
        assert_eq!(AppError::Domain(DomainError::NotAMember).status_code(), 403);
        assert_eq!(AppError::Domain(DomainError::StaleRequest).status_code(), 409);
        assert_eq!(
            AppError::Domain(DomainError::preference("테스트")).status_code(),
            400
        );
        assert_eq!(AppError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_error_codes_delegate_to_domain() {
        let err = AppError::Domain(DomainError::StaleRequest);
        assert_eq!(err.error_code(), "stale_request");
    }
}
