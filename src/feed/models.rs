//! Feed Data Models
//!
//! Posts and comments are the same entity, distinguished by
//! `parent_post_id`. Votes carry the voter's weight frozen at cast time.
//! Badge and post types are fixed tables; unknown values are rejected at
//! the API boundary, never coerced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

/// Direction of a vote. `None` retracts the caller's live vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
    None,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
            VoteDirection::None => "none",
        }
    }

    /// Whether this direction represents a live vote row.
    pub fn is_live(&self) -> bool {
        !matches!(self, VoteDirection::None)
    }

    pub fn parse(value: &str) -> Option<VoteDirection> {
        match value {
            "up" => Some(VoteDirection::Up),
            "down" => Some(VoteDirection::Down),
            "none" => Some(VoteDirection::None),
            _ => None,
        }
    }
}

/// The eight community badge types. Fixed set; each carries a display name
/// served by the badge-types endpoint and a configurable reputation weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeType {
    Funny,
    Informative,
    Controversial,
    Helpful,
    Creative,
    Insightful,
    WellWritten,
    Accurate,
}

impl BadgeType {
    pub const ALL: [BadgeType; 8] = [
        BadgeType::Funny,
        BadgeType::Informative,
        BadgeType::Controversial,
        BadgeType::Helpful,
        BadgeType::Creative,
        BadgeType::Insightful,
        BadgeType::WellWritten,
        BadgeType::Accurate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeType::Funny => "funny",
            BadgeType::Informative => "informative",
            BadgeType::Controversial => "controversial",
            BadgeType::Helpful => "helpful",
            BadgeType::Creative => "creative",
            BadgeType::Insightful => "insightful",
            BadgeType::WellWritten => "well_written",
            BadgeType::Accurate => "accurate",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BadgeType::Funny => "😄 Funny",
            BadgeType::Informative => "📚 Informative",
            BadgeType::Controversial => "🔥 Controversial",
            BadgeType::Helpful => "🤝 Helpful",
            BadgeType::Creative => "🎨 Creative",
            BadgeType::Insightful => "💡 Insightful",
            BadgeType::WellWritten => "✍️ Well Written",
            BadgeType::Accurate => "✅ Accurate",
        }
    }

    pub fn parse(value: &str) -> Option<BadgeType> {
        BadgeType::ALL.iter().copied().find(|b| b.as_str() == value)
    }
}

/// Recognized post content types. Fixed set restored from the documented
/// contract; the default is `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostType {
    Text,
    Image,
    Video,
    Link,
    Poll,
    Announcement,
}

impl PostType {
    pub const ALL: [PostType; 6] = [
        PostType::Text,
        PostType::Image,
        PostType::Video,
        PostType::Link,
        PostType::Poll,
        PostType::Announcement,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Text => "text",
            PostType::Image => "image",
            PostType::Video => "video",
            PostType::Link => "link",
            PostType::Poll => "poll",
            PostType::Announcement => "announcement",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PostType::Text => "Text",
            PostType::Image => "Image",
            PostType::Video => "Video",
            PostType::Link => "Link",
            PostType::Poll => "Poll",
            PostType::Announcement => "Announcement",
        }
    }

    pub fn parse(value: &str) -> Option<PostType> {
        PostType::ALL.iter().copied().find(|p| p.as_str() == value)
    }
}

impl Default for PostType {
    fn default() -> Self {
        PostType::Text
    }
}

/// A post or comment. Comments reference their parent through
/// `parent_post_id`; the parent must exist at creation time, which makes
/// cycles impossible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub post_type: PostType,
    pub tags: BTreeSet<String>,
    pub parent_post_id: Option<String>,
    pub created_at: DateTime<Utc>,

    /// Weighted vote tallies, maintained by the vote ledger
    pub upvote_weight_sum: f64,
    pub downvote_weight_sum: f64,

    /// Number of direct children
    pub comment_count: u64,

    /// Badge type -> award count
    pub badge_counts: HashMap<BadgeType, u64>,
}

impl Post {
    pub fn create(
        author_id: String,
        content: String,
        post_type: PostType,
        tags: BTreeSet<String>,
        parent_post_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            author_id,
            content,
            post_type,
            tags,
            parent_post_id,
            created_at: Utc::now(),
            upvote_weight_sum: 0.0,
            downvote_weight_sum: 0.0,
            comment_count: 0,
            badge_counts: HashMap::new(),
        }
    }

    /// Weighted upvote sum minus weighted downvote sum.
    pub fn net_score(&self) -> f64 {
        self.upvote_weight_sum - self.downvote_weight_sum
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_post_id.is_none()
    }

    pub fn total_badges(&self) -> u64 {
        self.badge_counts.values().sum()
    }
}

/// One live vote row. At most one per (voter, target); re-voting
/// overwrites the row rather than appending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub voter_id: String,
    pub target_post_id: String,
    /// Always `Up` or `Down` for a stored row; retraction deletes the row.
    pub direction: VoteDirection,
    /// The voter's vote weight frozen at the moment this row was written.
    pub weight_snapshot: f64,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn create(
        voter_id: String,
        target_post_id: String,
        direction: VoteDirection,
        weight_snapshot: f64,
    ) -> Self {
        Self {
            voter_id,
            target_post_id,
            direction,
            weight_snapshot,
            cast_at: Utc::now(),
        }
    }
}

/// A community badge placed on a post. Unique per
/// (awarder, post, badge type).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeAward {
    pub post_id: String,
    pub badge_type: BadgeType,
    pub awarder_id: String,
    pub awarded_at: DateTime<Utc>,
}

impl BadgeAward {
    pub fn create(post_id: String, badge_type: BadgeType, awarder_id: String) -> Self {
        Self {
            post_id,
            badge_type,
            awarder_id,
            awarded_at: Utc::now(),
        }
    }
}

/// A titled discussion branch anchored to a post. Threads nest through
/// `parent_thread_id` to unbounded depth; every ancestor must share the
/// same anchor post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubThread {
    pub id: String,
    pub anchor_post_id: String,
    pub parent_thread_id: Option<String>,
    pub title: String,
    pub description: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl SubThread {
    pub fn create(
        anchor_post_id: String,
        parent_thread_id: Option<String>,
        title: String,
        description: String,
        created_by: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            anchor_post_id,
            parent_thread_id,
            title,
            description,
            created_by,
            created_at: Utc::now(),
        }
    }
}
