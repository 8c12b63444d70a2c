//! API error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roster_auth::AuthError;
use roster_storage::StorageError;
use serde_json::json;
use thiserror::Error;

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request data.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Request data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or invalid credentials/token.
    ///
    /// Deliberately generic so callers cannot enumerate usernames.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("{entity_type} not found")]
    NotFound {
        /// Type of entity (e.g. "user", "group").
        entity_type: &'static str,
    },

    /// Storage layer error.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Creates a not found error.
    #[must_use]
    pub const fn not_found(entity_type: &'static str) -> Self {
        Self::NotFound { entity_type }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage(err) => {
                if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if err.is_duplicate() {
                    StatusCode::CONFLICT
                } else if matches!(err, StorageError::InvalidReference(_)) {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::InvalidToken => Self::Unauthorized,
            AuthError::Storage(inner) => Self::Storage(inner),
            AuthError::Hash(msg) => Self::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = json!({
            "code": -1,
            "message": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}
