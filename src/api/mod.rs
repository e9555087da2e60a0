//! HTTP API endpoints for the feed engine
//!
//! Provides REST APIs for:
//! - Feed API (posts, comments, votes, badges, sub-threads, search)
//! - Reputation API (weight/level lookups, discovery tables, stats)
//! - Caller identity extraction from the gateway-forwarded header

pub mod feed;
pub mod identity;
pub mod reputation;

pub use feed::{FeedApiState, create_router as create_feed_router};
pub use identity::{optional_user, require_user, USER_ID_HEADER};
pub use reputation::{ReputationApiState, create_router as create_reputation_router};
