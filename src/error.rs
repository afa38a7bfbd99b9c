//! Request errors and how they surface to callers.
//!
//! Internally the handler distinguishes where a failure came from; callers
//! only ever see one of the [`ErrorCategory`] values plus a message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::generator::GenerateError;
use crate::store::StoreError;

/// What the caller is told went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    Unauthenticated,
    InvalidArgument,
    NotFound,
    Internal,
}

impl ErrorCategory {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCategory::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("the function must be called while authenticated")]
    Unauthenticated,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("report {0} not found")]
    NotFound(String),

    /// A backing client could not be initialized.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// Generation failed or produced nothing usable.
    #[error("{0}")]
    Upstream(GenerateError),

    /// A record write or read failed.
    #[error("{0}")]
    Persistence(StoreError),
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument(message.into())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Unauthenticated => ErrorCategory::Unauthenticated,
            Error::InvalidArgument(_) => ErrorCategory::InvalidArgument,
            Error::NotFound(_) => ErrorCategory::NotFound,
            Error::ServiceUnavailable(_) | Error::Upstream(_) | Error::Persistence(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Unavailable(msg) => Error::ServiceUnavailable(msg),
            other => Error::Upstream(other),
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => Error::ServiceUnavailable(msg),
            other => Error::Persistence(other),
        }
    }
}

/// Wire shape of a failed call: `{"error": {"status": ..., "message": ...}}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub status: ErrorCategory,
    pub message: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let category = self.category();
        let body = ErrorBody {
            error: ErrorDetail {
                status: category,
                message: self.to_string(),
            },
        };
        (category.status_code(), Json(body)).into_response()
    }
}
