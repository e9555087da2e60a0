//! Feed Ranker
//!
//! Read-side views over the thread tree: the paginated top-level feed in
//! three sort orders, content search, and per-user post listings. Ranking
//! never mutates; it sorts a snapshot of the top-level posts at query time,
//! so pages are not snapshot-isolated across requests.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{FeedError, FeedResult};
use crate::feed::models::{BadgeType, Post};
use crate::feed::threads::ThreadTree;

/// Sort orders for the top-level feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSort {
    /// Newest first
    Timestamp,
    /// Highest net score first
    Weight,
    /// Most overall activity first
    Engagement,
}

impl FeedSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSort::Timestamp => "timestamp",
            FeedSort::Weight => "weight",
            FeedSort::Engagement => "engagement",
        }
    }

    pub fn parse(value: &str) -> FeedResult<Self> {
        match value {
            "timestamp" => Ok(FeedSort::Timestamp),
            "weight" => Ok(FeedSort::Weight),
            "engagement" => Ok(FeedSort::Engagement),
            other => Err(FeedError::validation(format!(
                "Unknown sort order '{}', expected one of: timestamp, weight, engagement",
                other
            ))),
        }
    }
}

impl Default for FeedSort {
    fn default() -> Self {
        FeedSort::Timestamp
    }
}

/// Pagination knobs for the listing endpoints.
#[derive(Debug, Clone)]
pub struct RankingTuning {
    /// Per-comment contribution to the engagement sort value
    pub comment_weight: f64,
    /// Page size when the caller does not pass a limit
    pub default_page_size: usize,
    /// Hard cap on requested page sizes
    pub max_page_size: usize,
}

impl Default for RankingTuning {
    fn default() -> Self {
        Self {
            comment_weight: 1.0,
            default_page_size: 50,
            max_page_size: 100,
        }
    }
}

/// One page of posts plus the pre-pagination candidate count.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    pub total: usize,
}

/// Crate-wide activity counters served by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct FeedStats {
    pub total_posts: u64,
    pub total_comments: u64,
    /// Live votes only; retraction decrements
    pub total_votes: u64,
    pub total_badges: u64,
    pub active_threads: u64,
}

pub struct FeedRanker {
    tree: Arc<ThreadTree>,
    tuning: RankingTuning,
    /// Per-badge-type contribution to the engagement sort value
    badge_weights: HashMap<BadgeType, f64>,
}

impl FeedRanker {
    pub fn new(
        tree: Arc<ThreadTree>,
        tuning: RankingTuning,
        badge_weights: HashMap<BadgeType, f64>,
    ) -> Self {
        Self {
            tree,
            tuning,
            badge_weights,
        }
    }

    /// Clamp a requested page size into the configured bounds.
    pub fn clamp_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.tuning.default_page_size)
            .clamp(1, self.tuning.max_page_size)
    }

    /// The top-level feed in the requested order. Comments never appear
    /// here; they are reachable through their parent post.
    pub fn list_feed(&self, sort_by: FeedSort, limit: Option<usize>, offset: usize) -> FeedPage {
        let mut candidates = self.tree.top_level_posts();
        let total = candidates.len();

        match sort_by {
            FeedSort::Timestamp => {
                candidates.sort_by(|a, b| {
                    b.created_at
                        .cmp(&a.created_at)
                        .then_with(|| b.id.cmp(&a.id))
                });
            }
            FeedSort::Weight => {
                candidates.sort_by(|a, b| {
                    b.net_score()
                        .partial_cmp(&a.net_score())
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| b.created_at.cmp(&a.created_at))
                        .then_with(|| b.id.cmp(&a.id))
                });
            }
            FeedSort::Engagement => {
                candidates.sort_by(|a, b| {
                    self.engagement_value(b)
                        .partial_cmp(&self.engagement_value(a))
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| b.created_at.cmp(&a.created_at))
                        .then_with(|| b.id.cmp(&a.id))
                });
            }
        }

        let limit = self.clamp_limit(limit);
        let posts = candidates.into_iter().skip(offset).take(limit).collect();
        FeedPage { posts, total }
    }

    /// Activity value used by the engagement sort: net score, comments at
    /// the configured weight, and badges at their per-type weights.
    fn engagement_value(&self, post: &Post) -> f64 {
        let badge_value: f64 = post
            .badge_counts
            .iter()
            .map(|(badge_type, count)| {
                self.badge_weights.get(badge_type).copied().unwrap_or(1.0) * *count as f64
            })
            .sum();
        post.net_score() + self.tuning.comment_weight * post.comment_count as f64 + badge_value
    }

    /// Case-insensitive substring search over top-level post content,
    /// newest first.
    pub fn search_posts(&self, query: &str, limit: Option<usize>) -> FeedResult<FeedPage> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(FeedError::validation("Search query must not be empty"));
        }

        let mut matches: Vec<Post> = self
            .tree
            .top_level_posts()
            .into_iter()
            .filter(|post| post.content.to_lowercase().contains(&needle))
            .collect();
        matches.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = matches.len();
        let limit = self.clamp_limit(limit);
        matches.truncate(limit);
        Ok(FeedPage {
            posts: matches,
            total,
        })
    }

    /// A user's top-level posts, newest first.
    pub fn list_user_posts(&self, user_id: &str, limit: Option<usize>, offset: usize) -> FeedPage {
        let mut posts: Vec<Post> = self
            .tree
            .top_level_posts()
            .into_iter()
            .filter(|post| post.author_id == user_id)
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let total = posts.len();
        let limit = self.clamp_limit(limit);
        let posts = posts.into_iter().skip(offset).take(limit).collect();
        FeedPage { posts, total }
    }
}
