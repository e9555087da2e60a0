//! Reputation API Endpoints
//!
//! Reputation lookups plus the discovery endpoints (badge types, post
//! types) and crate-wide stats.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::api::identity::require_user;
use crate::error::FeedError;
use crate::feed::{BadgeType, FeedService, FeedStats, PostType, ReputationView};

/// API state for reputation endpoints
#[derive(Clone)]
pub struct ReputationApiState {
    pub service: Arc<FeedService>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct ReputationResponse {
    pub success: bool,
    pub reputation: ReputationView,
}

#[derive(Debug, Serialize)]
pub struct BadgeTypeInfo {
    pub badge_type: BadgeType,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct BadgeTypesResponse {
    pub success: bool,
    pub badge_types: Vec<BadgeTypeInfo>,
}

#[derive(Debug, Serialize)]
pub struct PostTypeInfo {
    pub post_type: PostType,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct PostTypesResponse {
    pub success: bool,
    pub post_types: Vec<PostTypeInfo>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: FeedStats,
}

// Endpoints

/// GET /users/{user_id}/reputation - Any user's reputation
pub async fn get_user_reputation(
    State(state): State<ReputationApiState>,
    Path(user_id): Path<String>,
) -> Json<ReputationResponse> {
    Json(ReputationResponse {
        success: true,
        reputation: state.service.reputation_of(&user_id),
    })
}

/// GET /me/reputation - The caller's own reputation
pub async fn get_my_reputation(
    State(state): State<ReputationApiState>,
    headers: HeaderMap,
) -> Result<Json<ReputationResponse>, FeedError> {
    let user_id = require_user(&headers)?;

    Ok(Json(ReputationResponse {
        success: true,
        reputation: state.service.reputation_of(&user_id),
    }))
}

/// GET /badge-types - The fixed badge type table
pub async fn get_badge_types() -> Json<BadgeTypesResponse> {
    let badge_types = BadgeType::ALL
        .iter()
        .map(|badge_type| BadgeTypeInfo {
            badge_type: *badge_type,
            display_name: badge_type.display_name().to_string(),
        })
        .collect();

    Json(BadgeTypesResponse {
        success: true,
        badge_types,
    })
}

/// GET /post-types - The recognized post type table
pub async fn get_post_types() -> Json<PostTypesResponse> {
    let post_types = PostType::ALL
        .iter()
        .map(|post_type| PostTypeInfo {
            post_type: *post_type,
            display_name: post_type.display_name().to_string(),
        })
        .collect();

    Json(PostTypesResponse {
        success: true,
        post_types,
    })
}

/// GET /stats - Crate-wide activity counters
pub async fn get_stats(State(state): State<ReputationApiState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        success: true,
        stats: state.service.stats(),
    })
}

/// Create the reputation API router
pub fn create_router(state: ReputationApiState) -> Router {
    Router::new()
        .route("/users/{user_id}/reputation", get(get_user_reputation))
        .route("/me/reputation", get(get_my_reputation))
        .route("/badge-types", get(get_badge_types))
        .route("/post-types", get(get_post_types))
        .route("/stats", get(get_stats))
        .with_state(state)
}
