//! Feed Engine Error Taxonomy
//!
//! Every fallible operation in the engine returns one of these variants so
//! the HTTP layer can map outcomes to status codes uniformly. All error
//! responses carry a JSON body of the form `{"error": "<message>"}`.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Result alias used throughout the feed engine.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors surfaced by feed engine operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FeedError {
    /// Malformed input: oversized content, unknown enum value, illegal
    /// thread parenting. Never retried automatically.
    #[error("{0}")]
    Validation(String),

    /// A referenced post, thread, or user does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate badge award or otherwise conflicting state change.
    #[error("{0}")]
    Conflict(String),

    /// The caller exceeded the per-user action window.
    #[error("Rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Caller identity header missing or empty. Verification of the
    /// identity itself happens upstream of this service.
    #[error("Missing user identity")]
    Unauthorized,

    /// Invariant violation inside the engine. Logged in full, surfaced
    /// with a generic message.
    #[error("Internal error")]
    Internal(String),
}

impl FeedError {
    pub fn validation(message: impl Into<String>) -> Self {
        FeedError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        FeedError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        FeedError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        FeedError::Internal(message.into())
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedError::Validation(_) => StatusCode::BAD_REQUEST,
            FeedError::NotFound(_) => StatusCode::NOT_FOUND,
            FeedError::Conflict(_) => StatusCode::CONFLICT,
            FeedError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            FeedError::Unauthorized => StatusCode::UNAUTHORIZED,
            FeedError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FeedError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internal details go to the log, not to the client.
        let message = match &self {
            FeedError::Internal(detail) => {
                error!("Internal feed engine error: {}", detail);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if let FeedError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after_secs));
        }

        response
    }
}
