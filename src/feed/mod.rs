//! Feed Engine
//!
//! Posts, weighted votes, community badges, and sub-threads, served through
//! one orchestrating service.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!       request ──────►│ FeedService  │
//!                      └──────┬───────┘
//!          ┌──────────┬───────┴──────┬────────────┐
//!          ▼          ▼              ▼            ▼
//!   ┌────────────┐ ┌───────────┐ ┌──────────┐ ┌────────────┐
//!   │ VoteLedger │ │ BadgeReg. │ │ThreadTree│ │ FeedRanker │
//!   └─────┬──────┘ └─────┬─────┘ │ (content)│ │  (reads)   │
//!         │   guard +    │       └────▲─────┘ └─────▲──────┘
//!         │  reputation  │            │             │
//!         └──────┬───────┘    tallies + counts   sorted views
//!                ▼
//!        ReputationStore
//! ```
//!
//! Mutations pass the abuse guard, land in the thread tree's arena under
//! per-post entry locks, then update the affected users' reputation. The
//! ranker only ever reads.

mod badges;
mod ledger;
mod models;
mod ranking;
mod service;
mod threads;

pub use badges::{default_badge_weights, BadgeOutcome, BadgeRegistry};
pub use ledger::{VoteLedger, VoteOutcome};
pub use models::{BadgeAward, BadgeType, Post, PostType, SubThread, Vote, VoteDirection};
pub use ranking::{FeedPage, FeedRanker, FeedSort, FeedStats, RankingTuning};
pub use service::{FeedService, PostDetail, ReputationView, ServiceSettings};
pub use threads::{ContentLimits, ThreadTree};
