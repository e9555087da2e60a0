//! Reputation System
//!
//! Tracks per-user reputation and derives the vote weight a user's votes
//! carry. Weight feeds the vote ledger; badges and authored posts feed back
//! into reputation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────┐
//! │ ReputationRecord │────►│ ReputationStore  │◄──── VoteLedger (accuracy,
//! │ (scores+counters)│     │ (per-user state) │      vote counters)
//! └──────────────────┘     └──────────────────┘◄──── BadgeRegistry (badge score)
//!                                   │               ◄──── FeedService (engagement
//!                                   │                      on authoring)
//!                                   ▼
//!                           vote_weight ∈ [1.0, 5.0]
//!                           level: novice..legend
//! ```
//!
//! ## Weight Model
//!
//! - Engagement: unbounded accumulator, log1p diminishing returns
//! - Accuracy: EWMA of vote-vs-outcome agreement, neutral prior 0.5
//! - Badge score: weighted badge sum, linear up to saturation
//! - Weight = 1.0 + three bonuses, clamped to [1.0, 5.0]

mod score;
mod store;

pub use score::{
    ReputationLevel, ReputationRecord, ReputationTuning, MAX_VOTE_WEIGHT, MIN_VOTE_WEIGHT,
    NEUTRAL_ACCURACY,
};
pub use store::ReputationStore;
