//! Vote Ledger
//!
//! Records individual votes and keeps post tallies consistent with them.
//! At most one live vote exists per (voter, post); re-voting overwrites the
//! row. All mutations for one post run under that post's ledger entry, so
//! tally arithmetic is serialized per post while posts stay independent.
//!
//! Weight policy: the weight snapshot is re-sampled at every state change,
//! not frozen at the original cast. A voter whose reputation moved between
//! cast and toggle contributes the new weight from the toggle onward.

use dashmap::DashMap;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{FeedError, FeedResult};
use crate::feed::models::{Post, Vote, VoteDirection};
use crate::feed::threads::ThreadTree;
use crate::guard::AntiAbuseGuard;
use crate::reputation::ReputationStore;

/// Tolerance for comparing the running tallies against the signed sum of
/// live snapshots.
const TALLY_EPSILON: f64 = 1e-6;

/// Result of a vote action.
#[derive(Debug, Clone, Serialize)]
pub struct VoteOutcome {
    /// The target post with tallies as of this action
    pub post: Post,
    /// The caller's live direction after the action
    pub user_vote: Option<VoteDirection>,
    /// False when the action was an idempotent repeat
    pub changed: bool,
}

/// Reputation bookkeeping derived from a tally change, applied after the
/// post-side locks are released.
enum CounterUpdate {
    NewVote { is_up: bool },
    Toggled { now_up: bool },
    Retracted { was_up: bool },
}

pub struct VoteLedger {
    /// post_id -> voter_id -> live vote row
    votes: DashMap<String, HashMap<String, Vote>>,
    tree: Arc<ThreadTree>,
    reputation: Arc<ReputationStore>,
    guard: Arc<AntiAbuseGuard>,
}

impl VoteLedger {
    pub fn new(
        tree: Arc<ThreadTree>,
        reputation: Arc<ReputationStore>,
        guard: Arc<AntiAbuseGuard>,
    ) -> Self {
        Self {
            votes: DashMap::new(),
            tree,
            reputation,
            guard,
        }
    }

    /// Apply one vote action. Case analysis:
    /// - no prior vote, live direction: insert a row at the voter's
    ///   current weight
    /// - prior vote, different live direction: remove the old snapshot
    ///   from its bucket, add the freshly sampled weight to the new one
    /// - prior vote, same direction: idempotent no-op
    /// - direction `none`: subtract the stored snapshot and delete the row
    pub fn cast_vote(
        &self,
        voter_id: &str,
        post_id: &str,
        direction: VoteDirection,
    ) -> FeedResult<VoteOutcome> {
        let mut post = self.tree.require_post(post_id)?;
        let author_id = post.author_id.clone();

        // Serializes every vote mutation for this post
        let mut entry = self.votes.entry(post_id.to_string()).or_default();
        let rows = entry.value_mut();

        let existing_direction = rows.get(voter_id).map(|vote| vote.direction);
        let is_effective_change = existing_direction != Some(direction)
            && !(existing_direction.is_none() && direction == VoteDirection::None);

        self.guard.check_vote(voter_id, is_effective_change)?;

        if !is_effective_change {
            let user_vote = existing_direction;
            drop(entry);
            return Ok(VoteOutcome {
                post,
                user_vote,
                changed: false,
            });
        }

        let mut up_delta = 0.0;
        let mut down_delta = 0.0;
        let counter_update;
        let user_vote;

        match (rows.get(voter_id).cloned(), direction) {
            (None, VoteDirection::Up) | (None, VoteDirection::Down) => {
                let (weight, _) = self.reputation.get_weight(voter_id);
                if direction == VoteDirection::Up {
                    up_delta += weight;
                } else {
                    down_delta += weight;
                }
                rows.insert(
                    voter_id.to_string(),
                    Vote::create(
                        voter_id.to_string(),
                        post_id.to_string(),
                        direction,
                        weight,
                    ),
                );
                counter_update = CounterUpdate::NewVote {
                    is_up: direction == VoteDirection::Up,
                };
                user_vote = Some(direction);
                info!(
                    voter_id = %voter_id,
                    post_id = %post_id,
                    direction = direction.as_str(),
                    weight = weight,
                    "Vote cast"
                );
            }
            (Some(old), VoteDirection::Up) | (Some(old), VoteDirection::Down) => {
                // Weight is re-sampled at the change, not carried over
                let (weight, _) = self.reputation.get_weight(voter_id);
                match old.direction {
                    VoteDirection::Up => up_delta -= old.weight_snapshot,
                    VoteDirection::Down => down_delta -= old.weight_snapshot,
                    VoteDirection::None => {}
                }
                if direction == VoteDirection::Up {
                    up_delta += weight;
                } else {
                    down_delta += weight;
                }
                rows.insert(
                    voter_id.to_string(),
                    Vote::create(
                        voter_id.to_string(),
                        post_id.to_string(),
                        direction,
                        weight,
                    ),
                );
                counter_update = CounterUpdate::Toggled {
                    now_up: direction == VoteDirection::Up,
                };
                user_vote = Some(direction);
                info!(
                    voter_id = %voter_id,
                    post_id = %post_id,
                    direction = direction.as_str(),
                    "Vote direction changed"
                );
            }
            (Some(old), VoteDirection::None) => {
                match old.direction {
                    VoteDirection::Up => up_delta -= old.weight_snapshot,
                    VoteDirection::Down => down_delta -= old.weight_snapshot,
                    VoteDirection::None => {}
                }
                rows.remove(voter_id);
                counter_update = CounterUpdate::Retracted {
                    was_up: old.direction == VoteDirection::Up,
                };
                user_vote = None;
                info!(voter_id = %voter_id, post_id = %post_id, "Vote retracted");
            }
            (None, VoteDirection::None) => {
                // Covered by the idempotence check above
                drop(entry);
                return Ok(VoteOutcome {
                    post,
                    user_vote: None,
                    changed: false,
                });
            }
        }

        let (up_sum, down_sum) = self.tree.apply_vote_delta(post_id, up_delta, down_delta)?;

        // Tally invariant: the running sums must equal the signed sum of
        // live snapshots. A mismatch is never corrected by guessing.
        let expected: f64 = rows
            .values()
            .map(|vote| match vote.direction {
                VoteDirection::Up => vote.weight_snapshot,
                VoteDirection::Down => -vote.weight_snapshot,
                VoteDirection::None => 0.0,
            })
            .sum();
        let net = up_sum - down_sum;
        if (net - expected).abs() > TALLY_EPSILON {
            error!(
                post_id = %post_id,
                net_score = net,
                expected = expected,
                "Post tally drifted from live vote snapshots"
            );
            return Err(FeedError::internal(format!(
                "Tally drift on post {}: net {} vs snapshot sum {}",
                post_id, net, expected
            )));
        }

        drop(entry);

        // User-side bookkeeping happens after the post-side locks
        self.reputation.record_vote_given(voter_id);
        match counter_update {
            CounterUpdate::NewVote { is_up } => {
                self.reputation.record_vote_received(&author_id, is_up);
            }
            CounterUpdate::Toggled { now_up } => {
                self.reputation
                    .record_vote_direction_change(&author_id, now_up);
            }
            CounterUpdate::Retracted { was_up } => {
                self.reputation.record_vote_retracted(&author_id, was_up);
            }
        }

        post.upvote_weight_sum = up_sum;
        post.downvote_weight_sum = down_sum;
        Ok(VoteOutcome {
            post,
            user_vote,
            changed: true,
        })
    }

    /// The caller's live direction on a post, if any.
    pub fn user_vote(&self, post_id: &str, user_id: &str) -> Option<VoteDirection> {
        self.votes
            .get(post_id)
            .and_then(|rows| rows.get(user_id).map(|vote| vote.direction))
    }

    /// Feed accuracy observations to every live voter on a post once its
    /// net-score sign is considered stable. Driven by a periodic job
    /// outside this crate; voters whose direction matches the sign move
    /// toward 1.0, the rest toward 0.0. Returns the number of voters
    /// observed.
    pub fn observe_stabilized_outcome(&self, post_id: &str) -> FeedResult<usize> {
        let post = self.tree.require_post(post_id)?;
        let net = post.net_score();
        if net.abs() < TALLY_EPSILON {
            return Ok(0);
        }

        let voters: Vec<(String, VoteDirection)> = self
            .votes
            .get(post_id)
            .map(|rows| {
                rows.values()
                    .map(|vote| (vote.voter_id.clone(), vote.direction))
                    .collect()
            })
            .unwrap_or_default();

        for (voter_id, direction) in &voters {
            let matched = (*direction == VoteDirection::Up) == (net > 0.0);
            self.reputation
                .apply_accuracy_observation(voter_id, matched);
        }
        Ok(voters.len())
    }

    /// Number of live vote rows across all posts.
    pub fn live_vote_count(&self) -> u64 {
        self.votes
            .iter()
            .map(|entry| entry.value().len() as u64)
            .sum()
    }
}
