//! Reputation Record and Vote Weight Derivation
//!
//! A user's reputation is three accumulators (engagement, accuracy, badge
//! score) folded into a vote weight in [1.0, 5.0] at read time. Discrete
//! levels are derived from the weight. Stat counters ride along on the same
//! record for the reputation endpoints but never enter the weight formula.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lower bound of the derived vote weight (a vote never counts for less).
pub const MIN_VOTE_WEIGHT: f64 = 1.0;

/// Upper bound of the derived vote weight.
pub const MAX_VOTE_WEIGHT: f64 = 5.0;

/// Accuracy prior for users with no stabilized-outcome observations yet.
pub const NEUTRAL_ACCURACY: f64 = 0.5;

/// Tuning knobs for the weight formula. Configuration surface, not
/// hardcoded logic; see `ReputationConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationTuning {
    /// Engagement score at which the engagement bonus saturates at 1.0
    pub engagement_saturation: f64,
    /// Badge score at which the badge bonus saturates at 1.0
    pub badge_saturation: f64,
    /// EWMA smoothing factor for accuracy observations (0 < alpha <= 1)
    pub accuracy_alpha: f64,
    /// Engagement added per authored post or comment
    pub post_engagement_delta: f64,
}

impl Default for ReputationTuning {
    fn default() -> Self {
        Self {
            engagement_saturation: 500.0,
            badge_saturation: 25.0,
            accuracy_alpha: 0.1,
            post_engagement_delta: 1.0,
        }
    }
}

/// Discrete reputation tier derived from vote weight.
///
/// Boundaries are lower-inclusive: a weight of exactly 1.5 is Active and
/// exactly 4.5 is Legend. The maximum weight 5.0 is also Legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationLevel {
    Novice,
    Active,
    Experienced,
    Specialist,
    Legend,
}

impl ReputationLevel {
    pub fn from_weight(weight: f64) -> Self {
        if weight >= 4.5 {
            ReputationLevel::Legend
        } else if weight >= 3.5 {
            ReputationLevel::Specialist
        } else if weight >= 2.5 {
            ReputationLevel::Experienced
        } else if weight >= 1.5 {
            ReputationLevel::Active
        } else {
            ReputationLevel::Novice
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReputationLevel::Novice => "novice",
            ReputationLevel::Active => "active",
            ReputationLevel::Experienced => "experienced",
            ReputationLevel::Specialist => "specialist",
            ReputationLevel::Legend => "legend",
        }
    }
}

/// Per-user reputation state. Created lazily on first activity, never
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub user_id: String,

    /// Unbounded accumulator; a diminishing-returns transform is applied
    /// at read time, so raw growth never dominates the weight.
    pub engagement_score: f64,

    /// EWMA in [0, 1] of votes whose direction matched the eventual
    /// post-score sign.
    pub accuracy_score: f64,

    /// Weighted sum of badges received on the user's posts, saturation
    /// capped at read time.
    pub badge_score: f64,

    /// Stat counters (informational, not part of the weight formula)
    pub total_posts: u64,
    pub total_votes_given: u64,
    pub total_votes_received: u64,
    pub positive_votes_received: u64,
    pub badges_received: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReputationRecord {
    pub fn new(user_id: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            engagement_score: 0.0,
            accuracy_score: NEUTRAL_ACCURACY,
            badge_score: 0.0,
            total_posts: 0,
            total_votes_given: 0,
            total_votes_received: 0,
            positive_votes_received: 0,
            badges_received: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive the current vote weight:
    ///
    /// ```text
    /// engagement_bonus = min(1.0, log1p(engagement) / log1p(engagement_saturation))
    /// accuracy_bonus   = min(1.0, max(0.0, accuracy - 0.5) * 2.0)
    /// badge_bonus      = min(1.0, badge_score / badge_saturation)
    /// vote_weight      = clamp(1.0 + bonuses, 1.0, 5.0)
    /// ```
    pub fn vote_weight(&self, tuning: &ReputationTuning) -> f64 {
        let engagement_bonus =
            (self.engagement_score.ln_1p() / tuning.engagement_saturation.ln_1p()).min(1.0);
        let accuracy_bonus = ((self.accuracy_score - NEUTRAL_ACCURACY) * 2.0).clamp(0.0, 1.0);
        let badge_bonus = (self.badge_score / tuning.badge_saturation).min(1.0);

        (MIN_VOTE_WEIGHT + engagement_bonus + accuracy_bonus + badge_bonus)
            .clamp(MIN_VOTE_WEIGHT, MAX_VOTE_WEIGHT)
    }

    pub fn level(&self, tuning: &ReputationTuning) -> ReputationLevel {
        ReputationLevel::from_weight(self.vote_weight(tuning))
    }

    /// Fold one stabilized-outcome observation into the accuracy EWMA.
    /// Old observations decay in relevance instead of accumulating.
    pub fn observe_accuracy(&mut self, vote_was_correct: bool, alpha: f64) {
        let target = if vote_was_correct { 1.0 } else { 0.0 };
        self.accuracy_score = (1.0 - alpha) * self.accuracy_score + alpha * target;
        self.updated_at = Utc::now();
    }
}
