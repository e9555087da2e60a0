//! Anti-Abuse Guard
//!
//! Sits in front of every vote and badge mutation. Holds a rolling
//! per-user action window (no durable state, no external I/O) and the
//! duplicate-award verdict. Windows are sharded per user; there is no
//! cross-user coordination.
//!
//! Counting rules:
//! - A vote repeating the live direction is idempotent: allowed, not
//!   counted against the window.
//! - Toggling direction or retracting always counts.
//! - Badge awards share the same per-user window; a duplicate award is a
//!   `Conflict` before the window is consulted, so it never burns budget.

use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::error::{FeedError, FeedResult};
use crate::feed::BadgeType;

pub struct AntiAbuseGuard {
    /// Per-user timestamps of counted actions within the window
    actions: DashMap<String, VecDeque<Instant>>,
    /// Counted actions allowed per window
    max_actions: u32,
    /// Rolling window duration
    window: Duration,
}

impl AntiAbuseGuard {
    pub fn new(max_actions: u32, window: Duration) -> Self {
        Self {
            actions: DashMap::new(),
            max_actions,
            window,
        }
    }

    /// Verdict for a vote action. `is_effective_change` is false when the
    /// request repeats the caller's live direction; such no-ops pass
    /// without consuming budget.
    pub fn check_vote(&self, user_id: &str, is_effective_change: bool) -> FeedResult<()> {
        if !is_effective_change {
            return Ok(());
        }
        self.consume(user_id)
    }

    /// Verdict for a badge award. Duplicates conflict before any budget is
    /// spent, so the caller can react instead of silently losing the award.
    pub fn check_badge(
        &self,
        user_id: &str,
        badge_type: BadgeType,
        already_awarded: bool,
    ) -> FeedResult<()> {
        if already_awarded {
            return Err(FeedError::conflict(format!(
                "Badge '{}' already awarded to this post by the user",
                badge_type.as_str()
            )));
        }
        self.consume(user_id)
    }

    /// Count one action against the user's rolling window.
    fn consume(&self, user_id: &str) -> FeedResult<()> {
        let now = Instant::now();
        let mut entry = self
            .actions
            .entry(user_id.to_string())
            .or_insert_with(VecDeque::new);
        let window = entry.value_mut();

        // Drop timestamps that rolled out of the window
        while let Some(front) = window.front() {
            if now.duration_since(*front) >= self.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() as u32 >= self.max_actions {
            let retry_after_secs = window
                .front()
                .map(|oldest| {
                    self.window
                        .saturating_sub(now.duration_since(*oldest))
                        .as_secs()
                        .max(1)
                })
                .unwrap_or(1);
            warn!(
                user_id = %user_id,
                limit = self.max_actions,
                window_secs = self.window.as_secs(),
                "Action rate limit exceeded"
            );
            return Err(FeedError::RateLimited { retry_after_secs });
        }

        window.push_back(now);
        Ok(())
    }

    /// Drop users with no activity inside twice the window. Call
    /// periodically; returns how many user windows were removed.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let horizon = self.window * 2;
        let before = self.actions.len();
        self.actions.retain(|_, window| {
            window
                .back()
                .is_some_and(|last| now.duration_since(*last) < horizon)
        });
        before.saturating_sub(self.actions.len())
    }
}
