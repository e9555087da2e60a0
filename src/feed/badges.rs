//! Badge Registry
//!
//! Community badges awarded to posts. A user may award each badge type at
//! most once per post; duplicates are rejected before any rate budget is
//! spent. Awards feed the author's badge score through a per-type weight
//! table, which in turn lifts the author's vote weight.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::error::{FeedError, FeedResult};
use crate::feed::models::{BadgeAward, BadgeType, Post};
use crate::feed::threads::ThreadTree;
use crate::guard::AntiAbuseGuard;
use crate::reputation::ReputationStore;

/// Default badge score contribution per award. Higher-signal badges move
/// the author's badge score more; each is overridable through
/// `TESSERA_BADGE_WEIGHT_<TYPE>`.
pub fn default_badge_weights() -> HashMap<BadgeType, f64> {
    HashMap::from([
        (BadgeType::Accurate, 3.0),
        (BadgeType::Informative, 2.5),
        (BadgeType::Insightful, 2.0),
        (BadgeType::Helpful, 2.0),
        (BadgeType::WellWritten, 1.5),
        (BadgeType::Creative, 1.25),
        (BadgeType::Controversial, 0.75),
        (BadgeType::Funny, 0.5),
    ])
}

/// Result of a badge award.
#[derive(Debug, Clone, Serialize)]
pub struct BadgeOutcome {
    /// The target post with refreshed badge counts
    pub post: Post,
    /// The badge that was awarded
    pub badge_type: BadgeType,
}

pub struct BadgeRegistry {
    /// post_id -> (awarder_id, badge_type) -> award row
    awards: DashMap<String, HashMap<(String, BadgeType), BadgeAward>>,
    tree: Arc<ThreadTree>,
    reputation: Arc<ReputationStore>,
    guard: Arc<AntiAbuseGuard>,
    /// Badge score contribution per award, by type
    weights: HashMap<BadgeType, f64>,
}

impl BadgeRegistry {
    pub fn new(
        tree: Arc<ThreadTree>,
        reputation: Arc<ReputationStore>,
        guard: Arc<AntiAbuseGuard>,
        weights: HashMap<BadgeType, f64>,
    ) -> Self {
        Self {
            awards: DashMap::new(),
            tree,
            reputation,
            guard,
            weights,
        }
    }

    /// Award a badge to a post. Rejects self-awards and duplicate
    /// (awarder, type) pairs; the duplicate check runs before the rate
    /// budget is consumed.
    pub fn award_badge(
        &self,
        awarder_id: &str,
        post_id: &str,
        badge_type: BadgeType,
    ) -> FeedResult<BadgeOutcome> {
        let mut post = self.tree.require_post(post_id)?;
        if post.author_id == awarder_id {
            return Err(FeedError::validation("Cannot badge your own post"));
        }
        let author_id = post.author_id.clone();

        // Serializes awards for this post and pins the duplicate check
        let mut entry = self.awards.entry(post_id.to_string()).or_default();
        let rows = entry.value_mut();

        let key = (awarder_id.to_string(), badge_type);
        let already_awarded = rows.contains_key(&key);
        self.guard
            .check_badge(awarder_id, badge_type, already_awarded)?;

        rows.insert(
            key,
            BadgeAward::create(
                post_id.to_string(),
                badge_type,
                awarder_id.to_string(),
            ),
        );
        let badge_counts = self.tree.increment_badge_count(post_id, badge_type)?;
        drop(entry);

        let weight_delta = self.weights.get(&badge_type).copied().unwrap_or(1.0);
        self.reputation
            .record_badge_received(&author_id, weight_delta);

        info!(
            awarder_id = %awarder_id,
            post_id = %post_id,
            badge_type = badge_type.as_str(),
            "Badge awarded"
        );

        post.badge_counts = badge_counts;
        Ok(BadgeOutcome { post, badge_type })
    }

    /// Whether the user has already awarded this badge type to the post.
    pub fn has_award(&self, post_id: &str, awarder_id: &str, badge_type: BadgeType) -> bool {
        self.awards
            .get(post_id)
            .map(|rows| rows.contains_key(&(awarder_id.to_string(), badge_type)))
            .unwrap_or(false)
    }

    /// Badge types the user has awarded to the post.
    pub fn awards_by_user(&self, post_id: &str, awarder_id: &str) -> Vec<BadgeType> {
        self.awards
            .get(post_id)
            .map(|rows| {
                let mut types: Vec<BadgeType> = rows
                    .keys()
                    .filter(|(user, _)| user == awarder_id)
                    .map(|(_, badge_type)| *badge_type)
                    .collect();
                types.sort_by_key(|badge_type| badge_type.as_str());
                types
            })
            .unwrap_or_default()
    }

    /// Number of awards across all posts.
    pub fn award_count(&self) -> u64 {
        self.awards
            .iter()
            .map(|entry| entry.value().len() as u64)
            .sum()
    }
}
