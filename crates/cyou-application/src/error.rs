//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use cyou_files::FileError;
use cyou_store::StoreError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The referenced resource exists but is not in a state that allows
    /// the operation (e.g. applying to a closed job).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A sibling service could not be reached or answered with a failure.
    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A sibling service answered, but its record is missing data this
    /// service requires. Must never silently proceed.
    #[error("Dependency data invalid: {0}")]
    DependencyDataInvalid(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),

    #[error("File error: {0}")]
    File(FileError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn dependency_unavailable(msg: impl Into<String>) -> Self {
        Self::DependencyUnavailable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::InvalidState(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::DependencyUnavailable(_)
            | ApiError::DependencyDataInvalid(_)
            | ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::File(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Store failures keep their taxonomy position: a lost uniqueness race is a
/// conflict, a vanished row is not-found, anything else is a storage fault.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(msg) => ApiError::Conflict(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Storage(other),
        }
    }
}

/// Vault failures: a reference escaping the storage root is forbidden, a
/// missing file is not-found, a rejected upload is the caller's fault.
impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::PathEscape(_) => ApiError::Forbidden("Invalid file path".to_string()),
            FileError::NotFound(msg) => ApiError::NotFound(msg),
            FileError::UnsupportedType(msg) => ApiError::BadRequest(msg),
            FileError::TooLarge { size, max } => {
                ApiError::BadRequest(format!("file too large: {size} bytes (max {max})"))
            }
            FileError::InvalidName(name) => {
                ApiError::BadRequest(format!("invalid file name: {name}"))
            }
            other => ApiError::File(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::File(_)
            | ApiError::DependencyUnavailable(_)
            | ApiError::DependencyDataInvalid(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse { detail };

        (status, Json(body)).into_response()
    }
}
