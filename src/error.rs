//! Error types for Liber server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable numeric error codes exposed in API responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    Duplicate = 6,
    NoCopiesAvailable = 7,
    AlreadyReturned = 8,
    RetryConflict = 9,
    StoreUnavailable = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Borrow rejected because the book has no available copies
    #[error("No copies available")]
    NoCopiesAvailable,

    /// Return rejected because the borrowing is already closed
    #[error("Book already returned")]
    AlreadyReturned,

    /// Lock-wait timeout or serialization failure; the whole operation
    /// was rolled back and may be retried by the caller
    #[error("Transient conflict: {0}")]
    Retryable(String),

    /// The underlying store is unreachable; surfaced, never retried here
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a sqlx error for the transactional path.
    ///
    /// Lock-wait timeouts, serialization failures and deadlocks abort the
    /// transaction but are safe to retry from scratch; connection-level
    /// failures mean the store itself is gone. Everything else stays a
    /// plain database error.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::StoreUnavailable(err.to_string()),
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // lock_not_available, serialization_failure, deadlock_detected
                Some("55P03") | Some("40001") | Some("40P01") => {
                    AppError::Retryable(err.to_string())
                }
                _ => AppError::Database(err),
            },
            _ => AppError::Database(err),
        }
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::NoCopiesAvailable => (
                StatusCode::CONFLICT,
                ErrorCode::NoCopiesAvailable,
                "No copies available".to_string(),
            ),
            AppError::AlreadyReturned => (
                StatusCode::CONFLICT,
                ErrorCode::AlreadyReturned,
                "Book already returned".to_string(),
            ),
            AppError::Retryable(msg) => {
                tracing::warn!("Retryable conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorCode::RetryConflict,
                    "Conflicting concurrent operation, retry the request".to_string(),
                )
            }
            AppError::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::StoreUnavailable,
                    "Database unavailable".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_classifies_as_store_unavailable() {
        let err = AppError::from_sqlx(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[test]
    fn row_not_found_stays_a_database_error() {
        let err = AppError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn business_failures_map_to_conflict_status() {
        let response = AppError::NoCopiesAvailable.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = AppError::AlreadyReturned.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn store_unavailable_maps_to_service_unavailable() {
        let response = AppError::StoreUnavailable("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ErrorCode::NoCopiesAvailable as u32, 7);
        assert_eq!(ErrorCode::AlreadyReturned as u32, 8);
        assert_eq!(ErrorCode::RetryConflict as u32, 9);
        assert_eq!(ErrorCode::StoreUnavailable as u32, 10);
    }
}
