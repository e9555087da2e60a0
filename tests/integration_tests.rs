//! Integration tests for the Tessera feed engine
//!
//! These tests drive the full service surface end to end: posting and
//! comment threading, reputation-weighted voting, badge awards, abuse
//! budgets, sub-thread lineage, feed ranking, and concurrent tallying.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tessera_feed::{
    BadgeType, FeedError, FeedService, FeedSort, Post, PostType, ReputationLevel, ServiceSettings,
    VoteDirection,
};

// ============================================================================
// Test Helpers
// ============================================================================

/// Default settings with an effectively unlimited abuse budget so rate
/// limiting never interferes outside the tests that target it.
fn permissive_settings() -> ServiceSettings {
    ServiceSettings {
        max_actions_per_window: 1_000_000,
        ..ServiceSettings::default()
    }
}

/// Settings where the weight formula resolves to exact values: one
/// authored post saturates the engagement bonus, and a single Accurate
/// badge (weight 3.0) saturates the badge bonus.
fn calibrated_settings() -> ServiceSettings {
    let mut settings = permissive_settings();
    settings.reputation.engagement_saturation = 1.0;
    settings.reputation.badge_saturation = 3.0;
    settings
}

fn create_test_service() -> FeedService {
    FeedService::new(permissive_settings())
}

/// Create a top-level text post without tags.
fn seed_post(service: &FeedService, author: &str, content: &str) -> Post {
    service
        .create_post(author, content, PostType::Text, Vec::new(), None)
        .unwrap()
}

/// Seed a post and pause briefly so creation timestamps stay distinct
/// for order-sensitive assertions.
fn seed_post_spaced(service: &FeedService, author: &str, content: &str) -> Post {
    let post = seed_post(service, author, content);
    thread::sleep(Duration::from_millis(2));
    post
}

/// Raise a user's weight to exactly 3.0 under `calibrated_settings`:
/// one authored post saturates engagement and one Accurate badge from
/// `fan` saturates badges.
fn promote_to_weight_three(service: &FeedService, user: &str, fan: &str) {
    let own = seed_post(service, user, "background post");
    service
        .award_badge(fan, &own.id, BadgeType::Accurate)
        .unwrap();
}

// ============================================================================
// Posting and Comment Threading Tests
// ============================================================================

mod posting {
    use super::*;

    #[test]
    fn test_post_and_comment_flow() {
        let service = create_test_service();

        let post = seed_post(&service, "alice", "First post on the network");
        assert_eq!(post.author_id, "alice");
        assert_eq!(post.post_type, PostType::Text);
        assert!(post.parent_post_id.is_none());
        assert_eq!(post.comment_count, 0);
        assert!(post.net_score().abs() < f64::EPSILON);

        let comment = service
            .create_post(
                "bob",
                "Welcome aboard",
                PostType::Text,
                Vec::new(),
                Some(post.id.clone()),
            )
            .unwrap();
        assert_eq!(comment.parent_post_id.as_deref(), Some(post.id.as_str()));

        let detail = service.post_detail(&post.id, None).unwrap();
        assert_eq!(detail.post.comment_count, 1);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].id, comment.id);
    }

    #[test]
    fn test_authoring_credits_engagement() {
        let service = create_test_service();

        let post = seed_post(&service, "alice", "a post");
        service
            .create_post(
                "alice",
                "and a comment",
                PostType::Text,
                Vec::new(),
                Some(post.id.clone()),
            )
            .unwrap();

        // Posts and comments both count as authored content
        let view = service.reputation_of("alice");
        assert_eq!(view.total_posts, 2);
        assert!((view.engagement_score - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_content_validation() {
        let mut settings = permissive_settings();
        settings.limits.max_content_length = 40;
        settings.limits.max_tags = 2;
        settings.limits.max_tag_length = 8;
        let service = FeedService::new(settings);

        let err = service
            .create_post("alice", "   ", PostType::Text, Vec::new(), None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)), "Blank content");

        let long = "x".repeat(41);
        let err = service
            .create_post("alice", &long, PostType::Text, Vec::new(), None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)), "Oversized content");

        let tags = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let err = service
            .create_post("alice", "short enough", PostType::Text, tags, None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)), "Too many tags");

        let err = service
            .create_post(
                "alice",
                "short enough",
                PostType::Text,
                vec!["muchtoolong".to_string()],
                None,
            )
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)), "Oversized tag");
    }

    #[test]
    fn test_comment_parent_must_exist() {
        let service = create_test_service();

        let err = service
            .create_post(
                "bob",
                "orphaned reply",
                PostType::Text,
                Vec::new(),
                Some("no-such-post".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn test_nested_replies_stay_on_their_own_parent() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "root");

        let reply = service
            .create_post(
                "bob",
                "a reply",
                PostType::Text,
                Vec::new(),
                Some(post.id.clone()),
            )
            .unwrap();
        service
            .create_post(
                "carol",
                "a reply to the reply",
                PostType::Text,
                Vec::new(),
                Some(reply.id.clone()),
            )
            .unwrap();

        let detail = service.post_detail(&post.id, None).unwrap();
        assert_eq!(detail.post.comment_count, 1, "Only direct children count");

        let (children, total) = service.list_comments(&reply.id, None, 0).unwrap();
        assert_eq!(total, 1);
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_tags_deduplicated_and_trimmed() {
        let service = create_test_service();

        let post = service
            .create_post(
                "alice",
                "tagged post",
                PostType::Text,
                vec![" rust ".to_string(), "rust".to_string()],
                None,
            )
            .unwrap();
        assert_eq!(post.tags.len(), 1);
        assert!(post.tags.contains("rust"));
    }
}

// ============================================================================
// Weighted Voting Tests
// ============================================================================

mod voting {
    use super::*;

    #[test]
    fn test_first_vote_applies_snapshot_weight() {
        let service = FeedService::new(calibrated_settings());
        let post = seed_post(&service, "author", "a take");

        let outcome = service
            .cast_vote("newcomer", &post.id, VoteDirection::Up)
            .unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.user_vote, Some(VoteDirection::Up));
        // A fresh voter carries the floor weight of 1.0
        assert!((outcome.post.net_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_repeated_vote_is_idempotent() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "a take");

        service
            .cast_vote("newcomer", &post.id, VoteDirection::Up)
            .unwrap();
        let repeat = service
            .cast_vote("newcomer", &post.id, VoteDirection::Up)
            .unwrap();

        assert!(!repeat.changed, "Same-direction repeat must not change state");
        assert_eq!(repeat.user_vote, Some(VoteDirection::Up));
        assert!((repeat.post.net_score() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_toggle_swings_by_twice_the_weight() {
        let service = FeedService::new(calibrated_settings());
        let post = seed_post(&service, "author", "divisive claim");

        // The voter authored one post, so their weight is exactly 2.0
        seed_post(&service, "critic", "my own post");
        assert!((service.reputation_of("critic").vote_weight - 2.0).abs() < 1e-9);

        let up = service
            .cast_vote("critic", &post.id, VoteDirection::Up)
            .unwrap();
        assert!((up.post.net_score() - 2.0).abs() < 1e-9);

        let down = service
            .cast_vote("critic", &post.id, VoteDirection::Down)
            .unwrap();
        assert!(
            (down.post.net_score() + 2.0).abs() < 1e-9,
            "A toggle swings the net score by twice the voter's weight"
        );
    }

    #[test]
    fn test_retraction_restores_prior_score() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "a take");

        service
            .cast_vote("bob", &post.id, VoteDirection::Up)
            .unwrap();
        let retracted = service
            .cast_vote("bob", &post.id, VoteDirection::None)
            .unwrap();
        assert!(retracted.changed);
        assert_eq!(retracted.user_vote, None);
        assert!(retracted.post.net_score().abs() < 1e-9);

        // Retracting again with no live vote is a harmless no-op
        let again = service
            .cast_vote("bob", &post.id, VoteDirection::None)
            .unwrap();
        assert!(!again.changed);
        assert_eq!(again.user_vote, None);
    }

    #[test]
    fn test_weighted_tally_mixed_voters() {
        let service = FeedService::new(calibrated_settings());
        let post = seed_post(&service, "poster", "contested claim");

        promote_to_weight_three(&service, "veteran", "fan");
        assert!((service.reputation_of("veteran").vote_weight - 3.0).abs() < 1e-9);

        service
            .cast_vote("newcomer", &post.id, VoteDirection::Up)
            .unwrap();
        let after_down = service
            .cast_vote("veteran", &post.id, VoteDirection::Down)
            .unwrap();
        assert!((after_down.post.net_score() + 2.0).abs() < 1e-9);

        // The newcomer backs out; only the veteran's downvote remains
        let after_retract = service
            .cast_vote("newcomer", &post.id, VoteDirection::None)
            .unwrap();
        assert!((after_retract.post.net_score() + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_vote_weight_frozen_until_changed() {
        let service = FeedService::new(calibrated_settings());
        let post = seed_post(&service, "poster", "early take");

        service
            .cast_vote("riser", &post.id, VoteDirection::Up)
            .unwrap();

        // The voter's reputation grows after the vote landed
        promote_to_weight_three(&service, "riser", "fan");
        assert!((service.reputation_of("riser").vote_weight - 3.0).abs() < 1e-9);

        // The standing vote keeps its original snapshot
        let detail = service.post_detail(&post.id, None).unwrap();
        assert!((detail.post.net_score() - 1.0).abs() < 1e-9);

        // A direction change re-samples at the current weight
        let toggled = service
            .cast_vote("riser", &post.id, VoteDirection::Down)
            .unwrap();
        assert!((toggled.post.net_score() + 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_vote_requires_existing_post() {
        let service = create_test_service();

        let err = service
            .cast_vote("bob", "no-such-post", VoteDirection::Up)
            .unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn test_author_counters_track_votes() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "a take");

        service.cast_vote("u1", &post.id, VoteDirection::Up).unwrap();
        service
            .cast_vote("u2", &post.id, VoteDirection::Down)
            .unwrap();
        service
            .cast_vote("u1", &post.id, VoteDirection::Down)
            .unwrap();
        service
            .cast_vote("u2", &post.id, VoteDirection::None)
            .unwrap();

        let author = service.reputation_of("author");
        assert_eq!(
            author.total_votes_received, 2,
            "Received total is history, not live state"
        );
        assert_eq!(author.positive_votes_received, 0);

        let voter = service.reputation_of("u1");
        assert_eq!(voter.total_votes_given, 2);
    }
}

// ============================================================================
// Reputation Growth Tests
// ============================================================================

mod reputation_growth {
    use super::*;

    #[test]
    fn test_fresh_user_reads_novice_default() {
        let service = create_test_service();

        let view = service.reputation_of("ghost");
        assert!((view.vote_weight - 1.0).abs() < f64::EPSILON);
        assert_eq!(view.reputation_level, ReputationLevel::Novice);
        assert_eq!(view.total_posts, 0);
        assert_eq!(view.badges_received, 0);
        assert!((view.accuracy_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_authoring_raises_weight_and_level() {
        let service = FeedService::new(calibrated_settings());
        seed_post(&service, "writer", "my first post");

        let view = service.reputation_of("writer");
        assert!((view.vote_weight - 2.0).abs() < 1e-9);
        assert_eq!(view.reputation_level, ReputationLevel::Active);
    }

    #[test]
    fn test_badges_raise_the_authors_weight() {
        let service = FeedService::new(calibrated_settings());
        let post = seed_post(&service, "writer", "well researched post");

        service
            .award_badge("reader", &post.id, BadgeType::Accurate)
            .unwrap();

        let view = service.reputation_of("writer");
        assert!((view.badge_score - 3.0).abs() < 1e-9);
        assert!((view.vote_weight - 3.0).abs() < 1e-9);
        assert_eq!(view.reputation_level, ReputationLevel::Experienced);
        assert_eq!(view.badges_received, 1);
    }

    #[test]
    fn test_stabilized_outcome_feeds_accuracy() {
        let mut settings = calibrated_settings();
        // One observation fully decides the accuracy EWMA
        settings.reputation.accuracy_alpha = 1.0;
        let service = FeedService::new(settings);

        let post = seed_post(&service, "poster", "bold prediction");
        service
            .cast_vote("right1", &post.id, VoteDirection::Up)
            .unwrap();
        service
            .cast_vote("right2", &post.id, VoteDirection::Up)
            .unwrap();
        service
            .cast_vote("wrong", &post.id, VoteDirection::Down)
            .unwrap();

        let observed = service.observe_stabilized_outcome(&post.id).unwrap();
        assert_eq!(observed, 3);

        assert!((service.reputation_of("right1").accuracy_score - 1.0).abs() < 1e-9);
        assert!((service.reputation_of("right1").vote_weight - 2.0).abs() < 1e-9);
        assert!(service.reputation_of("wrong").accuracy_score.abs() < 1e-9);
        // Poor accuracy never drops a voter below the floor
        assert!((service.reputation_of("wrong").vote_weight - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_balanced_score_yields_no_observations() {
        let service = create_test_service();
        let post = seed_post(&service, "poster", "split opinion");

        service.cast_vote("u1", &post.id, VoteDirection::Up).unwrap();
        service
            .cast_vote("u2", &post.id, VoteDirection::Down)
            .unwrap();

        let observed = service.observe_stabilized_outcome(&post.id).unwrap();
        assert_eq!(observed, 0, "A zero net score settles nothing");
        assert!((service.reputation_of("u1").accuracy_score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_weight_saturates_below_the_cap() {
        let mut settings = calibrated_settings();
        settings.reputation.accuracy_alpha = 1.0;
        let service = FeedService::new(settings);

        // Saturate all three bonuses for one user
        let own = seed_post(&service, "hero", "authored content");
        service
            .award_badge("fan", &own.id, BadgeType::Accurate)
            .unwrap();

        let post = seed_post(&service, "poster", "community consensus");
        service
            .cast_vote("hero", &post.id, VoteDirection::Up)
            .unwrap();
        service
            .cast_vote("ally", &post.id, VoteDirection::Up)
            .unwrap();
        service.observe_stabilized_outcome(&post.id).unwrap();

        let view = service.reputation_of("hero");
        assert!(
            (view.vote_weight - 4.0).abs() < 1e-9,
            "Three saturated bonuses over the base of 1.0"
        );
        assert!(view.vote_weight <= 5.0);
        assert_eq!(view.reputation_level, ReputationLevel::Specialist);
    }
}

// ============================================================================
// Badge Award Tests
// ============================================================================

mod badges {
    use super::*;

    #[test]
    fn test_award_accumulates_counts() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "entertaining post");

        service
            .award_badge("u1", &post.id, BadgeType::Funny)
            .unwrap();
        let outcome = service
            .award_badge("u2", &post.id, BadgeType::Funny)
            .unwrap();
        assert_eq!(outcome.post.badge_counts.get(&BadgeType::Funny), Some(&2));

        // Funny carries the default weight of 0.5 per award
        let view = service.reputation_of("author");
        assert!((view.badge_score - 1.0).abs() < 1e-9);
        assert_eq!(view.badges_received, 2);
    }

    #[test]
    fn test_duplicate_award_conflicts() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "insightful take");

        service
            .award_badge("u1", &post.id, BadgeType::Insightful)
            .unwrap();
        let err = service
            .award_badge("u1", &post.id, BadgeType::Insightful)
            .unwrap_err();
        assert!(matches!(err, FeedError::Conflict(_)));

        // A different type from the same user is a separate award
        assert!(service
            .award_badge("u1", &post.id, BadgeType::Helpful)
            .is_ok());
    }

    #[test]
    fn test_self_award_rejected() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "my own brilliance");

        let err = service
            .award_badge("author", &post.id, BadgeType::Insightful)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));

        let detail = service.post_detail(&post.id, None).unwrap();
        assert!(detail.post.badge_counts.is_empty());
        assert_eq!(service.stats().total_badges, 0);
    }

    #[test]
    fn test_badge_weights_follow_settings() {
        let mut settings = permissive_settings();
        settings.badge_weights.insert(BadgeType::Funny, 10.0);
        let service = FeedService::new(settings);

        let post = seed_post(&service, "author", "a classic");
        service
            .award_badge("u1", &post.id, BadgeType::Funny)
            .unwrap();

        assert!((service.reputation_of("author").badge_score - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_viewer_badges_reported_per_user() {
        let service = create_test_service();
        let post = seed_post(&service, "author", "solid work");

        service
            .award_badge("alice", &post.id, BadgeType::Funny)
            .unwrap();
        service
            .award_badge("alice", &post.id, BadgeType::Accurate)
            .unwrap();
        service
            .award_badge("bob", &post.id, BadgeType::Helpful)
            .unwrap();

        let (counts, alice_awards) = service.post_badges(&post.id, Some("alice")).unwrap();
        assert_eq!(counts.len(), 3);
        assert_eq!(alice_awards, vec![BadgeType::Accurate, BadgeType::Funny]);

        let (_, anonymous) = service.post_badges(&post.id, None).unwrap();
        assert!(anonymous.is_empty());
    }
}

// ============================================================================
// Abuse Budget Tests
// ============================================================================

mod rate_limiting {
    use super::*;

    /// Service with a deliberately small per-user action budget.
    fn strict_service(max_actions: u32) -> FeedService {
        FeedService::new(ServiceSettings {
            max_actions_per_window: max_actions,
            ..ServiceSettings::default()
        })
    }

    #[test]
    fn test_effective_actions_exhaust_budget() {
        let service = strict_service(3);
        let posts: Vec<Post> = (0..4)
            .map(|i| seed_post(&service, "author", &format!("post number {}", i)))
            .collect();

        for post in posts.iter().take(3) {
            service
                .cast_vote("spender", &post.id, VoteDirection::Up)
                .unwrap();
        }

        let err = service
            .cast_vote("spender", &posts[3].id, VoteDirection::Up)
            .unwrap_err();
        assert!(matches!(
            err,
            FeedError::RateLimited { retry_after_secs } if retry_after_secs >= 1
        ));
    }

    #[test]
    fn test_idempotent_repeats_stay_free() {
        let service = strict_service(2);
        let post = seed_post(&service, "author", "steady take");

        service
            .cast_vote("voter", &post.id, VoteDirection::Up)
            .unwrap();
        for _ in 0..5 {
            let repeat = service
                .cast_vote("voter", &post.id, VoteDirection::Up)
                .unwrap();
            assert!(!repeat.changed);
        }

        // The second effective action still fits the budget of two
        service
            .cast_vote("voter", &post.id, VoteDirection::Down)
            .unwrap();
        // The third does not
        let err = service
            .cast_vote("voter", &post.id, VoteDirection::None)
            .unwrap_err();
        assert!(matches!(err, FeedError::RateLimited { .. }));
    }

    #[test]
    fn test_budget_is_per_user() {
        let service = strict_service(1);
        let post = seed_post(&service, "author", "one each");

        service
            .cast_vote("alice", &post.id, VoteDirection::Up)
            .unwrap();
        assert!(matches!(
            service.cast_vote("alice", &post.id, VoteDirection::Down),
            Err(FeedError::RateLimited { .. })
        ));

        // Other users are unaffected
        service
            .cast_vote("bob", &post.id, VoteDirection::Up)
            .unwrap();
    }

    #[test]
    fn test_duplicate_badge_rejected_before_budget() {
        let service = strict_service(1);
        let post = seed_post(&service, "author", "badge magnet");

        service
            .award_badge("alice", &post.id, BadgeType::Funny)
            .unwrap();

        // The duplicate is a conflict, not a rate limit, and costs nothing
        let err = service
            .award_badge("alice", &post.id, BadgeType::Funny)
            .unwrap_err();
        assert!(matches!(err, FeedError::Conflict(_)));

        // A fresh award is what actually hits the exhausted budget
        let err = service
            .award_badge("alice", &post.id, BadgeType::Helpful)
            .unwrap_err();
        assert!(matches!(err, FeedError::RateLimited { .. }));
    }
}

// ============================================================================
// Sub-Thread Lineage Tests
// ============================================================================

mod sub_threads {
    use super::*;

    #[test]
    fn test_thread_creation_and_listing() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "anchor post");

        let first = service
            .create_sub_thread("bob", &post.id, "Deep dive", "Follow-up discussion", None)
            .unwrap();
        assert_eq!(first.anchor_post_id, post.id);
        assert_eq!(first.created_by, "bob");
        assert!(first.parent_thread_id.is_none());

        thread::sleep(Duration::from_millis(2));
        let second = service
            .create_sub_thread("carol", &post.id, "Another angle", "", None)
            .unwrap();

        let threads = service.list_threads(&post.id).unwrap();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].id, second.id, "Newest thread comes first");
    }

    #[test]
    fn test_nested_threads_chain_to_one_anchor() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "anchor post");

        let a = service
            .create_sub_thread("bob", &post.id, "Level one", "", None)
            .unwrap();
        let b = service
            .create_sub_thread("bob", &post.id, "Level two", "", Some(a.id.clone()))
            .unwrap();
        let c = service
            .create_sub_thread("bob", &post.id, "Level three", "", Some(b.id.clone()))
            .unwrap();
        assert_eq!(c.parent_thread_id.as_deref(), Some(b.id.as_str()));

        assert_eq!(service.list_threads(&post.id).unwrap().len(), 3);
    }

    #[test]
    fn test_parent_anchored_elsewhere_rejected() {
        let service = create_test_service();
        let post_a = seed_post(&service, "alice", "first anchor");
        let post_b = seed_post(&service, "alice", "second anchor");

        let foreign = service
            .create_sub_thread("bob", &post_b.id, "Elsewhere", "", None)
            .unwrap();

        let err = service
            .create_sub_thread("bob", &post_a.id, "Wrong home", "", Some(foreign.id.clone()))
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }

    #[test]
    fn test_thread_requires_anchor_and_parent() {
        let service = create_test_service();

        let err = service
            .create_sub_thread("bob", "no-such-post", "Title", "", None)
            .unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));

        let post = seed_post(&service, "alice", "anchor post");
        let err = service
            .create_sub_thread(
                "bob",
                &post.id,
                "Title",
                "",
                Some("no-such-thread".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, FeedError::NotFound(_)));
    }

    #[test]
    fn test_thread_title_validation() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "anchor post");

        let err = service
            .create_sub_thread("bob", &post.id, "   ", "", None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));

        let long = "t".repeat(201);
        let err = service
            .create_sub_thread("bob", &post.id, &long, "", None)
            .unwrap_err();
        assert!(matches!(err, FeedError::Validation(_)));
    }
}

// ============================================================================
// Feed Ranking Tests
// ============================================================================

mod feed_ranking {
    use super::*;

    #[test]
    fn test_timestamp_sort_newest_first() {
        let service = create_test_service();
        let a = seed_post_spaced(&service, "alice", "oldest");
        let b = seed_post_spaced(&service, "bob", "middle");
        let c = seed_post(&service, "carol", "newest");

        let page = service.list_feed(FeedSort::Timestamp, None, 0);
        assert_eq!(page.total, 3);
        let ids: Vec<&str> = page.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![c.id.as_str(), b.id.as_str(), a.id.as_str()]);
    }

    #[test]
    fn test_weight_sort_breaks_ties_by_recency() {
        let service = create_test_service();
        let a = seed_post_spaced(&service, "alice", "older high scorer");
        let b = seed_post_spaced(&service, "bob", "newer high scorer");
        let c = seed_post(&service, "carol", "low scorer");

        // Fresh voters carry weight 1.0, so the nets are exactly 5, 5, 3
        for voter in ["v1", "v2", "v3", "v4", "v5"] {
            service.cast_vote(voter, &a.id, VoteDirection::Up).unwrap();
            service.cast_vote(voter, &b.id, VoteDirection::Up).unwrap();
        }
        for voter in ["v1", "v2", "v3"] {
            service.cast_vote(voter, &c.id, VoteDirection::Up).unwrap();
        }

        let page = service.list_feed(FeedSort::Weight, None, 0);
        let ids: Vec<&str> = page.posts.iter().map(|p| p.id.as_str()).collect();
        // Equal scores fall back to recency
        assert_eq!(ids, vec![b.id.as_str(), a.id.as_str(), c.id.as_str()]);
    }

    #[test]
    fn test_engagement_sort_counts_comments_and_badges() {
        let service = create_test_service();
        // x: one upvote plus two comments = 3.0
        let x = seed_post_spaced(&service, "alice", "discussion starter");
        // y: two upvotes = 2.0
        let y = seed_post_spaced(&service, "bob", "plain statement");
        // z: one comment plus an Accurate badge = 4.0
        let z = seed_post(&service, "carol", "sourced analysis");

        service.cast_vote("v1", &x.id, VoteDirection::Up).unwrap();
        service
            .create_post("v1", "agreed", PostType::Text, Vec::new(), Some(x.id.clone()))
            .unwrap();
        service
            .create_post(
                "v2",
                "disagree",
                PostType::Text,
                Vec::new(),
                Some(x.id.clone()),
            )
            .unwrap();

        service.cast_vote("v1", &y.id, VoteDirection::Up).unwrap();
        service.cast_vote("v2", &y.id, VoteDirection::Up).unwrap();

        service
            .create_post(
                "v1",
                "source please",
                PostType::Text,
                Vec::new(),
                Some(z.id.clone()),
            )
            .unwrap();
        service
            .award_badge("v2", &z.id, BadgeType::Accurate)
            .unwrap();

        let page = service.list_feed(FeedSort::Engagement, None, 0);
        let ids: Vec<&str> = page.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![z.id.as_str(), x.id.as_str(), y.id.as_str()]);
    }

    #[test]
    fn test_pagination_respects_configured_bounds() {
        let mut settings = permissive_settings();
        settings.ranking.default_page_size = 2;
        settings.ranking.max_page_size = 3;
        let service = FeedService::new(settings);

        for i in 0..5 {
            seed_post(&service, "alice", &format!("post number {}", i));
        }

        let default_page = service.list_feed(FeedSort::Timestamp, None, 0);
        assert_eq!(default_page.posts.len(), 2);
        assert_eq!(default_page.total, 5);

        let oversized = service.list_feed(FeedSort::Timestamp, Some(50), 0);
        assert_eq!(oversized.posts.len(), 3, "Requested limits clamp to the maximum");

        let undersized = service.list_feed(FeedSort::Timestamp, Some(0), 0);
        assert_eq!(undersized.posts.len(), 1, "A zero limit clamps up to one");

        let tail = service.list_feed(FeedSort::Timestamp, Some(3), 4);
        assert_eq!(tail.posts.len(), 1);
        assert_eq!(tail.total, 5);
    }

    #[test]
    fn test_feed_lists_top_level_posts_only() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "root");
        service
            .create_post(
                "bob",
                "a comment",
                PostType::Text,
                Vec::new(),
                Some(post.id.clone()),
            )
            .unwrap();

        let page = service.list_feed(FeedSort::Timestamp, None, 0);
        assert_eq!(page.total, 1);
        assert_eq!(page.posts[0].id, post.id);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let service = create_test_service();
        seed_post_spaced(&service, "alice", "Getting started with Rust generics");
        seed_post_spaced(&service, "bob", "Sourdough baking notes");
        let newest = seed_post(&service, "carol", "rust belt travel log");

        let page = service.search_posts("RUST", None).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.posts[0].id, newest.id, "Matches come back newest first");

        assert!(matches!(
            service.search_posts("   ", None),
            Err(FeedError::Validation(_))
        ));
    }

    #[test]
    fn test_user_posts_newest_first_excluding_comments() {
        let service = create_test_service();
        let first = seed_post_spaced(&service, "alice", "alice one");
        seed_post_spaced(&service, "bob", "bob one");
        let second = seed_post(&service, "alice", "alice two");
        service
            .create_post(
                "alice",
                "a comment",
                PostType::Text,
                Vec::new(),
                Some(first.id.clone()),
            )
            .unwrap();

        let page = service.list_user_posts("alice", None, 0);
        assert_eq!(page.total, 2);
        let ids: Vec<&str> = page.posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }
}

// ============================================================================
// Stats Tests
// ============================================================================

mod stats {
    use super::*;

    #[test]
    fn test_stats_follow_live_state() {
        let service = create_test_service();
        let post = seed_post(&service, "alice", "root");
        service
            .create_post(
                "bob",
                "a comment",
                PostType::Text,
                Vec::new(),
                Some(post.id.clone()),
            )
            .unwrap();
        service
            .create_sub_thread("bob", &post.id, "Side discussion", "", None)
            .unwrap();
        service
            .cast_vote("carol", &post.id, VoteDirection::Up)
            .unwrap();
        service
            .award_badge("carol", &post.id, BadgeType::Helpful)
            .unwrap();

        let stats = service.stats();
        assert_eq!(stats.total_posts, 1);
        assert_eq!(stats.total_comments, 1);
        assert_eq!(stats.total_votes, 1);
        assert_eq!(stats.total_badges, 1);
        assert_eq!(stats.active_threads, 1);

        // Retraction removes the live vote from the count
        service
            .cast_vote("carol", &post.id, VoteDirection::None)
            .unwrap();
        assert_eq!(service.stats().total_votes, 0);

        // A toggle keeps exactly one live vote per voter
        service
            .cast_vote("dave", &post.id, VoteDirection::Up)
            .unwrap();
        service
            .cast_vote("dave", &post.id, VoteDirection::Down)
            .unwrap();
        assert_eq!(service.stats().total_votes, 1);
    }
}

// ============================================================================
// Concurrency Tests
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_concurrent_upvotes_tally_exactly() {
        let service = Arc::new(create_test_service());
        let post = seed_post(&service, "author", "contested take");

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let service = service.clone();
                let post_id = post.id.clone();
                thread::spawn(move || {
                    service
                        .cast_vote(&format!("voter_{}", i), &post_id, VoteDirection::Up)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let detail = service.post_detail(&post.id, None).unwrap();
        assert!((detail.post.net_score() - 100.0).abs() < 1e-6);
        assert_eq!(service.stats().total_votes, 100);
    }

    #[test]
    fn test_concurrent_badge_awards_count_once_each() {
        let service = Arc::new(create_test_service());
        let post = seed_post(&service, "author", "badge magnet");

        let handles: Vec<_> = (0..50)
            .map(|i| {
                let service = service.clone();
                let post_id = post.id.clone();
                thread::spawn(move || {
                    service
                        .award_badge(&format!("fan_{}", i), &post_id, BadgeType::Funny)
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let detail = service.post_detail(&post.id, None).unwrap();
        assert_eq!(detail.post.badge_counts.get(&BadgeType::Funny), Some(&50));
        // Funny carries 0.5, and all fifty land on the author
        assert!((service.reputation_of("author").badge_score - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_concurrent_vote_cycles_settle_at_zero() {
        let service = Arc::new(create_test_service());
        let post = seed_post(&service, "author", "churned take");

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let service = service.clone();
                let post_id = post.id.clone();
                thread::spawn(move || {
                    let voter = format!("churner_{}", i);
                    service
                        .cast_vote(&voter, &post_id, VoteDirection::Up)
                        .unwrap();
                    service
                        .cast_vote(&voter, &post_id, VoteDirection::Down)
                        .unwrap();
                    service
                        .cast_vote(&voter, &post_id, VoteDirection::None)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let detail = service.post_detail(&post.id, None).unwrap();
        assert!(detail.post.net_score().abs() < 1e-9);
        assert_eq!(service.stats().total_votes, 0);
    }
}
