//! Reputation Store
//!
//! Shared in-memory store of per-user reputation records. Records are
//! created lazily on first activity and never deleted. Every mutation goes
//! through a per-user map entry, so concurrent updates to one user are
//! serialized without a global lock.

use dashmap::DashMap;
use tracing::debug;

use crate::reputation::score::{
    ReputationLevel, ReputationRecord, ReputationTuning, MIN_VOTE_WEIGHT,
};

pub struct ReputationStore {
    records: DashMap<String, ReputationRecord>,
    tuning: ReputationTuning,
}

impl ReputationStore {
    pub fn new(tuning: ReputationTuning) -> Self {
        Self {
            records: DashMap::new(),
            tuning,
        }
    }

    pub fn tuning(&self) -> &ReputationTuning {
        &self.tuning
    }

    /// Current vote weight and level for a user. Reads never create a
    /// record; absent users get the defaults.
    pub fn get_weight(&self, user_id: &str) -> (f64, ReputationLevel) {
        match self.records.get(user_id) {
            Some(record) => (
                record.vote_weight(&self.tuning),
                record.level(&self.tuning),
            ),
            None => (MIN_VOTE_WEIGHT, ReputationLevel::Novice),
        }
    }

    /// Full record for the reputation endpoints. Absent users get a
    /// default-valued record without one being stored.
    pub fn snapshot(&self, user_id: &str) -> ReputationRecord {
        self.records
            .get(user_id)
            .map(|record| record.clone())
            .unwrap_or_else(|| ReputationRecord::new(user_id.to_string()))
    }

    /// Adjust the engagement accumulator. Deltas may be negative; the
    /// accumulator never goes below zero.
    pub fn apply_engagement_delta(&self, user_id: &str, delta: f64) {
        self.with_record(user_id, |record| {
            record.engagement_score = (record.engagement_score + delta).max(0.0);
        });
    }

    /// Fold one stabilized-outcome observation into the user's accuracy
    /// EWMA.
    pub fn apply_accuracy_observation(&self, user_id: &str, vote_was_correct: bool) {
        let alpha = self.tuning.accuracy_alpha;
        self.with_record(user_id, |record| {
            record.observe_accuracy(vote_was_correct, alpha);
        });
    }

    /// Adjust the badge score accumulator. Never goes below zero.
    pub fn apply_badge_delta(&self, user_id: &str, delta: f64) {
        self.with_record(user_id, |record| {
            record.badge_score = (record.badge_score + delta).max(0.0);
        });
    }

    /// A post or comment was authored: bump the post counter and add the
    /// configured engagement delta in one entry access.
    pub fn record_post_authored(&self, user_id: &str) {
        let delta = self.tuning.post_engagement_delta;
        self.with_record(user_id, |record| {
            record.total_posts += 1;
            record.engagement_score = (record.engagement_score + delta).max(0.0);
        });
    }

    /// The user performed an effective vote action (new, toggle, retract).
    pub fn record_vote_given(&self, user_id: &str) {
        self.with_record(user_id, |record| {
            record.total_votes_given += 1;
        });
    }

    /// A new vote landed on one of the user's posts.
    pub fn record_vote_received(&self, user_id: &str, is_upvote: bool) {
        self.with_record(user_id, |record| {
            record.total_votes_received += 1;
            if is_upvote {
                record.positive_votes_received += 1;
            }
        });
    }

    /// An existing vote on the user's post flipped direction. The total
    /// received count is history and stays put; only the positive count
    /// moves.
    pub fn record_vote_direction_change(&self, user_id: &str, now_upvote: bool) {
        self.with_record(user_id, |record| {
            if now_upvote {
                record.positive_votes_received += 1;
            } else {
                record.positive_votes_received = record.positive_votes_received.saturating_sub(1);
            }
        });
    }

    /// A vote on the user's post was retracted.
    pub fn record_vote_retracted(&self, user_id: &str, was_upvote: bool) {
        self.with_record(user_id, |record| {
            if was_upvote {
                record.positive_votes_received = record.positive_votes_received.saturating_sub(1);
            }
        });
    }

    /// A badge landed on one of the user's posts: bump the counter and the
    /// badge score in one entry access.
    pub fn record_badge_received(&self, user_id: &str, weight_delta: f64) {
        self.with_record(user_id, |record| {
            record.badges_received += 1;
            record.badge_score = (record.badge_score + weight_delta).max(0.0);
        });
    }

    fn with_record<F>(&self, user_id: &str, mutate: F)
    where
        F: FnOnce(&mut ReputationRecord),
    {
        let mut entry = self
            .records
            .entry(user_id.to_string())
            .or_insert_with(|| {
                debug!(user_id = %user_id, "Creating reputation record");
                ReputationRecord::new(user_id.to_string())
            });
        let record = entry.value_mut();
        mutate(record);
        record.updated_at = chrono::Utc::now();
    }
}
