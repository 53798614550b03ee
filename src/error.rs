//! Error types for Bookshelf server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Numeric error codes exposed in error response bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 3,
    NoSuchBook = 5,
    Duplicate = 8,
    BadValue = 18,
    FavoriteLimitReached = 22,
    DbTimeout = 23,
}

/// Classification of an error, independent of how it is transported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Validation,
    NotFound,
    Conflict,
    CapacityExceeded,
    StoreFailure,
    StoreTimeout,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Store timed out: {0}")]
    StoreTimeout(String),
}

impl AppError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::CapacityExceeded(_) => ErrorKind::CapacityExceeded,
            AppError::Database(sqlx::Error::PoolTimedOut) => ErrorKind::StoreTimeout,
            // 57014 = query_canceled, raised when statement_timeout fires
            AppError::Database(sqlx::Error::Database(e)) if e.code().as_deref() == Some("57014") => {
                ErrorKind::StoreTimeout
            }
            AppError::Database(_) | AppError::Store(_) => ErrorKind::StoreFailure,
            AppError::StoreTimeout(_) => ErrorKind::StoreTimeout,
        }
    }

    /// Whether the error is a business-rule refusal rather than an infrastructure failure
    pub fn is_refusal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidArgument | ErrorKind::NotFound | ErrorKind::CapacityExceeded
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect();
        messages.sort();
        AppError::Validation(messages.join("; "))
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
        let (status, code, message) = match self.kind() {
            ErrorKind::InvalidArgument | ErrorKind::Validation => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, self.message())
            }
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, self.message()),
            ErrorKind::Conflict => (StatusCode::CONFLICT, ErrorCode::Duplicate, self.message()),
            ErrorKind::CapacityExceeded => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::FavoriteLimitReached,
                self.message(),
            ),
            ErrorKind::StoreTimeout => {
                tracing::error!("Store timeout: {:?}", self);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::DbTimeout,
                    "Database timeout".to_string(),
                )
            }
            ErrorKind::StoreFailure => {
                tracing::error!("Database error: {:?}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
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

impl AppError {
    fn message(&self) -> String {
        match self {
            AppError::InvalidArgument(msg)
            | AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::CapacityExceeded(msg)
            | AppError::Store(msg)
            | AppError::StoreTimeout(msg) => msg.clone(),
            AppError::Database(e) => e.to_string(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
