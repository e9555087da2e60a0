//! Feed Service
//!
//! Owns every component and wires them together: the thread tree holds the
//! content, the ledger and badge registry mutate it under the abuse guard,
//! the reputation store absorbs the fallout, and the ranker serves reads.
//! API handlers and the maintenance loop talk to this type only; nothing in
//! the crate reaches for global state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FeedResult;
use crate::feed::badges::{default_badge_weights, BadgeOutcome, BadgeRegistry};
use crate::feed::ledger::{VoteLedger, VoteOutcome};
use crate::feed::models::{BadgeType, Post, PostType, SubThread, VoteDirection};
use crate::feed::ranking::{FeedPage, FeedRanker, FeedSort, FeedStats, RankingTuning};
use crate::feed::threads::{ContentLimits, ThreadTree};
use crate::guard::AntiAbuseGuard;
use crate::reputation::{ReputationLevel, ReputationStore, ReputationTuning};

/// Everything needed to assemble a service instance. `config.rs` maps the
/// environment onto this.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub limits: ContentLimits,
    /// Max effective actions per user within the rolling window
    pub max_actions_per_window: u32,
    pub action_window: Duration,
    pub reputation: ReputationTuning,
    pub ranking: RankingTuning,
    pub badge_weights: HashMap<BadgeType, f64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            limits: ContentLimits::default(),
            max_actions_per_window: 60,
            action_window: Duration::from_secs(600),
            reputation: ReputationTuning::default(),
            ranking: RankingTuning::default(),
            badge_weights: default_badge_weights(),
        }
    }
}

/// A post with the context the detail endpoint returns.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: Post,
    /// First page of direct comments, creation order
    pub comments: Vec<Post>,
    pub viewer_vote: Option<VoteDirection>,
    pub viewer_badges: Vec<BadgeType>,
}

/// Reputation record rendered with its derived values, as served by the
/// reputation endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ReputationView {
    pub user_id: String,
    pub engagement_score: f64,
    pub accuracy_score: f64,
    pub badge_score: f64,
    pub vote_weight: f64,
    pub reputation_level: ReputationLevel,
    pub total_posts: u64,
    pub total_votes_given: u64,
    pub total_votes_received: u64,
    pub positive_votes_received: u64,
    pub badges_received: u64,
    pub last_updated: DateTime<Utc>,
}

pub struct FeedService {
    tree: Arc<ThreadTree>,
    reputation: Arc<ReputationStore>,
    guard: Arc<AntiAbuseGuard>,
    ledger: VoteLedger,
    badges: BadgeRegistry,
    ranker: FeedRanker,
}

impl FeedService {
    pub fn new(settings: ServiceSettings) -> Self {
        let tree = Arc::new(ThreadTree::new(settings.limits));
        let reputation = Arc::new(ReputationStore::new(settings.reputation));
        let guard = Arc::new(AntiAbuseGuard::new(
            settings.max_actions_per_window,
            settings.action_window,
        ));
        let ledger = VoteLedger::new(tree.clone(), reputation.clone(), guard.clone());
        let badges = BadgeRegistry::new(
            tree.clone(),
            reputation.clone(),
            guard.clone(),
            settings.badge_weights.clone(),
        );
        let ranker = FeedRanker::new(tree.clone(), settings.ranking, settings.badge_weights);
        Self {
            tree,
            reputation,
            guard,
            ledger,
            badges,
            ranker,
        }
    }

    /// Create a post or comment and credit the author's engagement.
    pub fn create_post(
        &self,
        author_id: &str,
        content: &str,
        post_type: PostType,
        tags: Vec<String>,
        parent_post_id: Option<String>,
    ) -> FeedResult<Post> {
        let post = self
            .tree
            .create_post(author_id, content, post_type, tags, parent_post_id)?;
        self.reputation.record_post_authored(author_id);
        Ok(post)
    }

    /// A post with its first page of comments and the viewer's own vote
    /// and badge state. Viewer fields stay empty for anonymous reads.
    pub fn post_detail(&self, post_id: &str, viewer: Option<&str>) -> FeedResult<PostDetail> {
        let post = self.tree.require_post(post_id)?;
        let comments = self
            .tree
            .list_children(post_id, self.ranker.clamp_limit(None), 0)?;
        let viewer_vote = viewer.and_then(|user| self.ledger.user_vote(post_id, user));
        let viewer_badges = viewer
            .map(|user| self.badges.awards_by_user(post_id, user))
            .unwrap_or_default();
        Ok(PostDetail {
            post,
            comments,
            viewer_vote,
            viewer_badges,
        })
    }

    /// Direct comments of a post plus the total comment count.
    pub fn list_comments(
        &self,
        post_id: &str,
        limit: Option<usize>,
        offset: usize,
    ) -> FeedResult<(Vec<Post>, u64)> {
        let post = self.tree.require_post(post_id)?;
        let comments = self
            .tree
            .list_children(post_id, self.ranker.clamp_limit(limit), offset)?;
        Ok((comments, post.comment_count))
    }

    pub fn cast_vote(
        &self,
        voter_id: &str,
        post_id: &str,
        direction: VoteDirection,
    ) -> FeedResult<VoteOutcome> {
        self.ledger.cast_vote(voter_id, post_id, direction)
    }

    pub fn award_badge(
        &self,
        awarder_id: &str,
        post_id: &str,
        badge_type: BadgeType,
    ) -> FeedResult<BadgeOutcome> {
        self.badges.award_badge(awarder_id, post_id, badge_type)
    }

    /// A post's badge counts plus the viewer's own awards on it.
    pub fn post_badges(
        &self,
        post_id: &str,
        viewer: Option<&str>,
    ) -> FeedResult<(HashMap<BadgeType, u64>, Vec<BadgeType>)> {
        let post = self.tree.require_post(post_id)?;
        let viewer_badges = viewer
            .map(|user| self.badges.awards_by_user(post_id, user))
            .unwrap_or_default();
        Ok((post.badge_counts, viewer_badges))
    }

    pub fn create_sub_thread(
        &self,
        created_by: &str,
        anchor_post_id: &str,
        title: &str,
        description: &str,
        parent_thread_id: Option<String>,
    ) -> FeedResult<SubThread> {
        self.tree
            .create_sub_thread(anchor_post_id, created_by, title, description, parent_thread_id)
    }

    pub fn list_threads(&self, post_id: &str) -> FeedResult<Vec<SubThread>> {
        self.tree.list_threads(post_id)
    }

    pub fn list_feed(&self, sort_by: FeedSort, limit: Option<usize>, offset: usize) -> FeedPage {
        self.ranker.list_feed(sort_by, limit, offset)
    }

    pub fn search_posts(&self, query: &str, limit: Option<usize>) -> FeedResult<FeedPage> {
        self.ranker.search_posts(query, limit)
    }

    pub fn list_user_posts(&self, user_id: &str, limit: Option<usize>, offset: usize) -> FeedPage {
        self.ranker.list_user_posts(user_id, limit, offset)
    }

    /// Reputation with derived weight and level. Unknown users render as
    /// the lazy default; reads never create records.
    pub fn reputation_of(&self, user_id: &str) -> ReputationView {
        let record = self.reputation.snapshot(user_id);
        let tuning = self.reputation.tuning();
        ReputationView {
            vote_weight: record.vote_weight(tuning),
            reputation_level: record.level(tuning),
            user_id: record.user_id,
            engagement_score: record.engagement_score,
            accuracy_score: record.accuracy_score,
            badge_score: record.badge_score,
            total_posts: record.total_posts,
            total_votes_given: record.total_votes_given,
            total_votes_received: record.total_votes_received,
            positive_votes_received: record.positive_votes_received,
            badges_received: record.badges_received,
            last_updated: record.updated_at,
        }
    }

    pub fn stats(&self) -> FeedStats {
        let (total_posts, total_comments) = self.tree.post_counts();
        FeedStats {
            total_posts,
            total_comments,
            total_votes: self.ledger.live_vote_count(),
            total_badges: self.badges.award_count(),
            active_threads: self.tree.thread_count(),
        }
    }

    /// Accuracy settlement hook for the periodic sign-stabilization job.
    pub fn observe_stabilized_outcome(&self, post_id: &str) -> FeedResult<usize> {
        self.ledger.observe_stabilized_outcome(post_id)
    }

    /// Drop abuse-window entries idle long enough to be irrelevant.
    pub fn run_guard_cleanup(&self) -> usize {
        self.guard.cleanup()
    }
}
