//! Caller Identity
//!
//! Authentication mechanics live upstream; the gateway verifies the caller
//! and forwards the user id in the `X-User-Id` header. Mutating endpoints
//! require it, listing endpoints degrade to an anonymous view without it.

use axum::http::HeaderMap;

use crate::error::{FeedError, FeedResult};

pub const USER_ID_HEADER: &str = "x-user-id";

/// The caller's user id, if the gateway forwarded one.
pub fn optional_user(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// The caller's user id, or `Unauthorized` when the header is missing.
pub fn require_user(headers: &HeaderMap) -> FeedResult<String> {
    optional_user(headers).ok_or(FeedError::Unauthorized)
}
