//! Tessera Feed Engine
//!
//! Reputation-weighted voting and community-badge engine for the Tessera
//! decentralized social feed. Decides how much a user's vote counts, how
//! posts accumulate weighted score, how badges feed back into reputation,
//! and how comment/sub-thread trees are organized and served.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── main.rs        - Server entrypoint
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Error taxonomy and HTTP mapping
//! ├── guard.rs       - Anti-abuse sliding-window rate limiting
//! ├── reputation/    - Per-user reputation and vote weight
//! │   ├── score.rs   - Reputation record, weight formula, levels
//! │   └── store.rs   - Shared in-memory reputation state
//! ├── feed/          - Posts, votes, badges, threads, ranking
//! │   ├── models.rs  - Post, Vote, BadgeType, SubThread
//! │   ├── threads.rs - Post/comment/sub-thread tree
//! │   ├── ledger.rs  - Vote rows and tally maintenance
//! │   ├── badges.rs  - Badge awards and uniqueness
//! │   ├── ranking.rs - Sorted feed views, search, stats
//! │   └── service.rs - Orchestrating service
//! └── api/           - HTTP API endpoints
//!     ├── feed.rs    - Posts / votes / badges / threads / search
//!     ├── reputation.rs - Reputation, discovery tables, stats
//!     └── identity.rs - Caller identity extraction
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod guard;
pub mod reputation;

// Re-export main types for convenience
pub use config::FeedConfig;
pub use error::{FeedError, FeedResult};
pub use guard::AntiAbuseGuard;

// Re-export feed types
pub use feed::{
    BadgeAward, BadgeOutcome, BadgeRegistry, BadgeType, ContentLimits, FeedPage, FeedRanker,
    FeedService, FeedSort, FeedStats, Post, PostDetail, PostType, RankingTuning, ReputationView,
    ServiceSettings, SubThread, ThreadTree, Vote, VoteDirection, VoteLedger, VoteOutcome,
};

// Re-export reputation types
pub use reputation::{
    ReputationLevel, ReputationRecord, ReputationStore, ReputationTuning, MAX_VOTE_WEIGHT,
    MIN_VOTE_WEIGHT, NEUTRAL_ACCURACY,
};

// Re-export API types
pub use api::{
    create_feed_router, create_reputation_router, FeedApiState, ReputationApiState,
};
