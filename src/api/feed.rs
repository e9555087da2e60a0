//! Feed API Endpoints
//!
//! Posts, comments, votes, badges, and sub-threads under `/api/feed`.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::identity::{optional_user, require_user};
use crate::error::{FeedError, FeedResult};
use crate::feed::{
    BadgeType, FeedService, FeedSort, Post, PostType, SubThread, VoteDirection,
};

/// API state for feed endpoints
#[derive(Clone)]
pub struct FeedApiState {
    pub service: Arc<FeedService>,
}

// Request types

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub post_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub parent_post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote_type: String,
}

#[derive(Debug, Deserialize)]
pub struct BadgeRequest {
    pub badge_type: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub title: String,
    pub description: Option<String>,
    pub parent_thread_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

// Response types

#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub post: Post,
}

#[derive(Debug, Serialize)]
pub struct FeedListResponse {
    pub success: bool,
    pub posts: Vec<Post>,
    pub total: usize,
    pub offset: usize,
    pub sort_by: String,
}

#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    pub success: bool,
    pub post: Post,
    pub comments: Vec<Post>,
    pub badges: HashMap<BadgeType, u64>,
    pub user_vote: Option<VoteDirection>,
}

#[derive(Debug, Serialize)]
pub struct CommentListResponse {
    pub success: bool,
    pub comments: Vec<Post>,
    pub total: u64,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub success: bool,
    pub post: Post,
    pub user_vote: Option<VoteDirection>,
}

#[derive(Debug, Serialize)]
pub struct BadgeAwardResponse {
    pub success: bool,
    pub message: String,
    pub badges: HashMap<BadgeType, u64>,
}

#[derive(Debug, Serialize)]
pub struct BadgeListResponse {
    pub success: bool,
    pub badges: HashMap<BadgeType, u64>,
    /// Badge types the caller has awarded; null for anonymous readers
    pub user_badges: Option<Vec<BadgeType>>,
}

#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub success: bool,
    pub thread: SubThread,
}

#[derive(Debug, Serialize)]
pub struct ThreadListResponse {
    pub success: bool,
    pub threads: Vec<SubThread>,
}

#[derive(Debug, Serialize)]
pub struct UserPostsResponse {
    pub success: bool,
    pub posts: Vec<Post>,
    pub total: usize,
    pub offset: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub posts: Vec<Post>,
    pub total: usize,
}

// Payload parsing; unknown enum values are rejected, never coerced

fn parse_post_type(raw: Option<&str>) -> FeedResult<PostType> {
    match raw {
        Some(value) => PostType::parse(value).ok_or_else(|| {
            FeedError::validation(format!(
                "Unknown post type '{}', expected one of: text, image, video, link, poll, announcement",
                value
            ))
        }),
        None => Ok(PostType::default()),
    }
}

fn parse_direction(raw: &str) -> FeedResult<VoteDirection> {
    VoteDirection::parse(raw).ok_or_else(|| {
        FeedError::validation(format!(
            "Unknown vote type '{}', expected one of: up, down, none",
            raw
        ))
    })
}

fn parse_badge_type(raw: &str) -> FeedResult<BadgeType> {
    BadgeType::parse(raw)
        .ok_or_else(|| FeedError::validation(format!("Unknown badge type '{}'", raw)))
}

fn parse_sort(raw: Option<&str>) -> FeedResult<FeedSort> {
    match raw {
        Some(value) => FeedSort::parse(value),
        None => Ok(FeedSort::default()),
    }
}

// Endpoints

/// POST /posts - Create a post or comment
pub async fn create_post(
    State(state): State<FeedApiState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), FeedError> {
    let user_id = require_user(&headers)?;
    let post_type = parse_post_type(payload.post_type.as_deref())?;

    let post = state.service.create_post(
        &user_id,
        &payload.content,
        post_type,
        payload.tags,
        payload.parent_post_id,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PostResponse {
            success: true,
            post,
        }),
    ))
}

/// GET /posts - Paginated top-level feed
pub async fn list_feed(
    State(state): State<FeedApiState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedListResponse>, FeedError> {
    let sort_by = parse_sort(query.sort_by.as_deref())?;
    let offset = query.offset.unwrap_or(0);

    let page = state.service.list_feed(sort_by, query.limit, offset);

    Ok(Json(FeedListResponse {
        success: true,
        posts: page.posts,
        total: page.total,
        offset,
        sort_by: sort_by.as_str().to_string(),
    }))
}

/// GET /posts/{post_id} - A post with its first page of comments
pub async fn get_post(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<PostDetailResponse>, FeedError> {
    let viewer = optional_user(&headers);
    let detail = state.service.post_detail(&post_id, viewer.as_deref())?;

    Ok(Json(PostDetailResponse {
        success: true,
        badges: detail.post.badge_counts.clone(),
        post: detail.post,
        comments: detail.comments,
        user_vote: detail.viewer_vote,
    }))
}

/// GET /posts/{post_id}/comments - Direct comments in creation order
pub async fn list_comments(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<CommentListResponse>, FeedError> {
    let offset = query.offset.unwrap_or(0);
    let (comments, total) = state.service.list_comments(&post_id, query.limit, offset)?;

    Ok(Json(CommentListResponse {
        success: true,
        comments,
        total,
        offset,
    }))
}

/// POST /posts/{post_id}/vote - Cast, change, or retract a vote
pub async fn cast_vote(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, FeedError> {
    let user_id = require_user(&headers)?;
    let direction = parse_direction(&payload.vote_type)?;

    let outcome = state.service.cast_vote(&user_id, &post_id, direction)?;

    Ok(Json(VoteResponse {
        success: true,
        post: outcome.post,
        user_vote: outcome.user_vote,
    }))
}

/// POST /posts/{post_id}/badges - Award a badge
pub async fn award_badge(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<BadgeRequest>,
) -> Result<Json<BadgeAwardResponse>, FeedError> {
    let user_id = require_user(&headers)?;
    let badge_type = parse_badge_type(&payload.badge_type)?;

    let outcome = state.service.award_badge(&user_id, &post_id, badge_type)?;

    Ok(Json(BadgeAwardResponse {
        success: true,
        message: format!("Badge '{}' awarded", outcome.badge_type.display_name()),
        badges: outcome.post.badge_counts,
    }))
}

/// GET /posts/{post_id}/badges - Badge counts on a post
pub async fn get_post_badges(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<BadgeListResponse>, FeedError> {
    let viewer = optional_user(&headers);
    let (badges, viewer_badges) = state.service.post_badges(&post_id, viewer.as_deref())?;

    Ok(Json(BadgeListResponse {
        success: true,
        badges,
        user_badges: viewer.map(|_| viewer_badges),
    }))
}

/// POST /posts/{post_id}/threads - Open a sub-thread under a post
pub async fn create_thread(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<CreateThreadRequest>,
) -> Result<(StatusCode, Json<ThreadResponse>), FeedError> {
    let user_id = require_user(&headers)?;

    let thread = state.service.create_sub_thread(
        &user_id,
        &post_id,
        &payload.title,
        payload.description.as_deref().unwrap_or(""),
        payload.parent_thread_id,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ThreadResponse {
            success: true,
            thread,
        }),
    ))
}

/// GET /posts/{post_id}/threads - Sub-threads anchored to a post
pub async fn list_threads(
    State(state): State<FeedApiState>,
    Path(post_id): Path<String>,
) -> Result<Json<ThreadListResponse>, FeedError> {
    let threads = state.service.list_threads(&post_id)?;

    Ok(Json(ThreadListResponse {
        success: true,
        threads,
    }))
}

/// GET /users/{user_id}/posts - A user's top-level posts, newest first
pub async fn list_user_posts(
    State(state): State<FeedApiState>,
    Path(user_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<UserPostsResponse>, FeedError> {
    let offset = query.offset.unwrap_or(0);
    let page = state.service.list_user_posts(&user_id, query.limit, offset);

    Ok(Json(UserPostsResponse {
        success: true,
        posts: page.posts,
        total: page.total,
        offset,
    }))
}

/// GET /search - Case-insensitive content search over top-level posts
pub async fn search_posts(
    State(state): State<FeedApiState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, FeedError> {
    let page = state
        .service
        .search_posts(query.q.as_deref().unwrap_or(""), query.limit)?;

    Ok(Json(SearchResponse {
        success: true,
        posts: page.posts,
        total: page.total,
    }))
}

/// Create the feed API router
pub fn create_router(state: FeedApiState) -> Router {
    Router::new()
        .route("/posts", post(create_post).get(list_feed))
        .route("/posts/{post_id}", get(get_post))
        .route("/posts/{post_id}/comments", get(list_comments))
        .route("/posts/{post_id}/vote", post(cast_vote))
        .route(
            "/posts/{post_id}/badges",
            post(award_badge).get(get_post_badges),
        )
        .route(
            "/posts/{post_id}/threads",
            post(create_thread).get(list_threads),
        )
        .route("/users/{user_id}/posts", get(list_user_posts))
        .route("/search", get(search_posts))
        .with_state(state)
}
