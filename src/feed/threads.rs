//! Thread Tree
//!
//! Arena storage for posts, comments, and sub-threads. Posts and comments
//! live in one map keyed by id with parent-id back-references; children are
//! tracked append-only so listings stay stable under concurrent insertion.
//! Sub-threads nest to unbounded depth, so every ancestry walk is an
//! explicit loop, never recursion.

use dashmap::DashMap;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, error, info};

use crate::error::{FeedError, FeedResult};
use crate::feed::models::{BadgeType, Post, PostType, SubThread};

/// Validation bounds for user-supplied content. Configuration surface; see
/// `LimitsConfig`.
#[derive(Debug, Clone)]
pub struct ContentLimits {
    pub max_content_length: usize,
    pub max_title_length: usize,
    pub max_description_length: usize,
    pub max_tags: usize,
    pub max_tag_length: usize,
}

impl Default for ContentLimits {
    fn default() -> Self {
        Self {
            max_content_length: 10_000,
            max_title_length: 200,
            max_description_length: 1_000,
            max_tags: 10,
            max_tag_length: 40,
        }
    }
}

pub struct ThreadTree {
    /// Post id -> post (posts and comments alike)
    posts: DashMap<String, Post>,
    /// Post id -> direct child ids in creation order
    children: DashMap<String, Vec<String>>,
    /// Thread id -> sub-thread
    threads: DashMap<String, SubThread>,
    /// Anchor post id -> thread ids
    threads_by_post: DashMap<String, Vec<String>>,
    limits: ContentLimits,
}

impl ThreadTree {
    pub fn new(limits: ContentLimits) -> Self {
        Self {
            posts: DashMap::new(),
            children: DashMap::new(),
            threads: DashMap::new(),
            threads_by_post: DashMap::new(),
            limits,
        }
    }

    /// Create a post or, when `parent_post_id` is set, a comment. The
    /// parent must already exist, which is what makes cycles impossible.
    pub fn create_post(
        &self,
        author_id: &str,
        content: &str,
        post_type: PostType,
        tags: Vec<String>,
        parent_post_id: Option<String>,
    ) -> FeedResult<Post> {
        let content = content.trim();
        if content.is_empty() {
            return Err(FeedError::validation("Content cannot be empty"));
        }
        if content.chars().count() > self.limits.max_content_length {
            return Err(FeedError::validation(format!(
                "Content exceeds maximum length of {} characters",
                self.limits.max_content_length
            )));
        }

        let tags = self.validate_tags(tags)?;

        if let Some(parent_id) = &parent_post_id {
            if !self.posts.contains_key(parent_id) {
                return Err(FeedError::not_found("Parent post not found"));
            }
        }

        let post = Post::create(
            author_id.to_string(),
            content.to_string(),
            post_type,
            tags,
            parent_post_id.clone(),
        );

        self.posts.insert(post.id.clone(), post.clone());

        if let Some(parent_id) = &parent_post_id {
            // Parent tally entry first, then the append-only child list
            if let Some(mut parent) = self.posts.get_mut(parent_id) {
                parent.comment_count += 1;
            }
            self.children
                .entry(parent_id.clone())
                .or_default()
                .push(post.id.clone());
            debug!(post_id = %post.id, parent_id = %parent_id, "Comment created");
        } else {
            info!(post_id = %post.id, author_id = %author_id, "Post created");
        }

        Ok(post)
    }

    fn validate_tags(&self, tags: Vec<String>) -> FeedResult<BTreeSet<String>> {
        if tags.len() > self.limits.max_tags {
            return Err(FeedError::validation(format!(
                "At most {} tags are allowed",
                self.limits.max_tags
            )));
        }
        let mut cleaned = BTreeSet::new();
        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() {
                return Err(FeedError::validation("Tags cannot be empty"));
            }
            if tag.chars().count() > self.limits.max_tag_length {
                return Err(FeedError::validation(format!(
                    "Tag '{}' exceeds maximum length of {} characters",
                    tag, self.limits.max_tag_length
                )));
            }
            cleaned.insert(tag.to_string());
        }
        Ok(cleaned)
    }

    pub fn get_post(&self, post_id: &str) -> Option<Post> {
        self.posts.get(post_id).map(|post| post.clone())
    }

    pub fn require_post(&self, post_id: &str) -> FeedResult<Post> {
        self.get_post(post_id)
            .ok_or_else(|| FeedError::not_found("Post not found"))
    }

    pub fn post_exists(&self, post_id: &str) -> bool {
        self.posts.contains_key(post_id)
    }

    /// Direct children of a post in creation order (`created_at`
    /// ascending). Restartable: the child list only ever appends, so a
    /// given offset never skips earlier entries.
    pub fn list_children(&self, post_id: &str, limit: usize, offset: usize) -> FeedResult<Vec<Post>> {
        if !self.posts.contains_key(post_id) {
            return Err(FeedError::not_found("Post not found"));
        }

        let child_ids: Vec<String> = self
            .children
            .get(post_id)
            .map(|ids| ids.iter().skip(offset).take(limit).cloned().collect())
            .unwrap_or_default();

        Ok(child_ids
            .iter()
            .filter_map(|id| self.get_post(id))
            .collect())
    }

    /// Create a sub-thread anchored to a post. A nested thread must chain
    /// to the same anchor through every ancestor; a parent anchored to a
    /// different post is rejected, never silently reparented.
    pub fn create_sub_thread(
        &self,
        anchor_post_id: &str,
        created_by: &str,
        title: &str,
        description: &str,
        parent_thread_id: Option<String>,
    ) -> FeedResult<SubThread> {
        if !self.posts.contains_key(anchor_post_id) {
            return Err(FeedError::not_found("Post not found"));
        }

        let title = title.trim();
        if title.is_empty() {
            return Err(FeedError::validation("Thread title cannot be empty"));
        }
        if title.chars().count() > self.limits.max_title_length {
            return Err(FeedError::validation(format!(
                "Thread title exceeds maximum length of {} characters",
                self.limits.max_title_length
            )));
        }
        if description.chars().count() > self.limits.max_description_length {
            return Err(FeedError::validation(format!(
                "Thread description exceeds maximum length of {} characters",
                self.limits.max_description_length
            )));
        }

        if let Some(parent_id) = &parent_thread_id {
            self.verify_thread_lineage(parent_id, anchor_post_id)?;
        }

        let thread = SubThread::create(
            anchor_post_id.to_string(),
            parent_thread_id,
            title.to_string(),
            description.to_string(),
            created_by.to_string(),
        );

        self.threads.insert(thread.id.clone(), thread.clone());
        self.threads_by_post
            .entry(anchor_post_id.to_string())
            .or_default()
            .push(thread.id.clone());

        info!(
            thread_id = %thread.id,
            anchor_post_id = %anchor_post_id,
            "Sub-thread created"
        );
        Ok(thread)
    }

    /// Walk the parent chain iteratively and require every ancestor to be
    /// anchored to `anchor_post_id`. Depth is unbounded by design, so this
    /// must never recurse.
    fn verify_thread_lineage(&self, parent_id: &str, anchor_post_id: &str) -> FeedResult<()> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = Some(parent_id.to_string());

        while let Some(thread_id) = current {
            if !visited.insert(thread_id.clone()) {
                // Creation-time parent checks make cycles impossible
                error!(thread_id = %thread_id, "Cycle detected in sub-thread ancestry");
                return Err(FeedError::internal(format!(
                    "Sub-thread ancestry cycle at {}",
                    thread_id
                )));
            }

            let thread = self
                .threads
                .get(&thread_id)
                .ok_or_else(|| FeedError::not_found("Parent thread not found"))?;

            if thread.anchor_post_id != anchor_post_id {
                return Err(FeedError::validation(
                    "Parent thread is anchored to a different post",
                ));
            }

            current = thread.parent_thread_id.clone();
        }

        Ok(())
    }

    /// Sub-threads of a post, newest first.
    pub fn list_threads(&self, post_id: &str) -> FeedResult<Vec<SubThread>> {
        if !self.posts.contains_key(post_id) {
            return Err(FeedError::not_found("Post not found"));
        }

        let mut threads: Vec<SubThread> = self
            .threads_by_post
            .get(post_id)
            .map(|ids| ids.iter().filter_map(|id| self.get_thread(id)).collect())
            .unwrap_or_default();

        threads.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(threads)
    }

    pub fn get_thread(&self, thread_id: &str) -> Option<SubThread> {
        self.threads.get(thread_id).map(|thread| thread.clone())
    }

    /// Adjust a post's weighted vote tallies under its entry lock. Returns
    /// the updated (upvote_sum, downvote_sum).
    pub fn apply_vote_delta(
        &self,
        post_id: &str,
        up_delta: f64,
        down_delta: f64,
    ) -> FeedResult<(f64, f64)> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| FeedError::not_found("Post not found"))?;
        post.upvote_weight_sum += up_delta;
        post.downvote_weight_sum += down_delta;
        Ok((post.upvote_weight_sum, post.downvote_weight_sum))
    }

    /// Increment a post's badge count under its entry lock. Returns the
    /// updated counts.
    pub fn increment_badge_count(
        &self,
        post_id: &str,
        badge_type: BadgeType,
    ) -> FeedResult<HashMap<BadgeType, u64>> {
        let mut post = self
            .posts
            .get_mut(post_id)
            .ok_or_else(|| FeedError::not_found("Post not found"))?;
        *post.badge_counts.entry(badge_type).or_insert(0) += 1;
        Ok(post.badge_counts.clone())
    }

    /// All top-level posts, unordered. The ranker applies its own sort.
    pub fn top_level_posts(&self) -> Vec<Post> {
        self.posts
            .iter()
            .filter(|entry| entry.value().is_top_level())
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// (top-level posts, comments) currently stored.
    pub fn post_counts(&self) -> (u64, u64) {
        let mut top_level = 0u64;
        let mut comments = 0u64;
        for entry in self.posts.iter() {
            if entry.value().is_top_level() {
                top_level += 1;
            } else {
                comments += 1;
            }
        }
        (top_level, comments)
    }

    pub fn thread_count(&self) -> u64 {
        self.threads.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> ThreadTree {
        ThreadTree::new(ContentLimits::default())
    }

    fn make_post(tree: &ThreadTree, author: &str) -> Post {
        tree.create_post(author, "hello world", PostType::Text, vec![], None)
            .unwrap()
    }

    #[test]
    fn test_content_validation() {
        let tree = tree();

        assert!(matches!(
            tree.create_post("alice", "   ", PostType::Text, vec![], None),
            Err(FeedError::Validation(_))
        ));

        let oversized = "x".repeat(10_001);
        assert!(matches!(
            tree.create_post("alice", &oversized, PostType::Text, vec![], None),
            Err(FeedError::Validation(_))
        ));

        let too_many_tags = (0..11).map(|i| format!("tag{}", i)).collect();
        assert!(matches!(
            tree.create_post("alice", "ok", PostType::Text, too_many_tags, None),
            Err(FeedError::Validation(_))
        ));
    }

    #[test]
    fn test_comment_requires_existing_parent() {
        let tree = tree();
        let missing = tree.create_post(
            "alice",
            "reply",
            PostType::Text,
            vec![],
            Some("ghost".to_string()),
        );
        assert!(matches!(missing, Err(FeedError::NotFound(_))));
    }

    #[test]
    fn test_comment_bumps_parent_count() {
        let tree = tree();
        let post = make_post(&tree, "alice");

        for i in 0..3 {
            tree.create_post(
                "bob",
                &format!("reply {}", i),
                PostType::Text,
                vec![],
                Some(post.id.clone()),
            )
            .unwrap();
        }

        assert_eq!(tree.get_post(&post.id).unwrap().comment_count, 3);
        let children = tree.list_children(&post.id, 50, 0).unwrap();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].content, "reply 0");
        assert_eq!(children[2].content, "reply 2");
    }

    #[test]
    fn test_children_pagination_is_stable() {
        let tree = tree();
        let post = make_post(&tree, "alice");
        for i in 0..5 {
            tree.create_post(
                "bob",
                &format!("reply {}", i),
                PostType::Text,
                vec![],
                Some(post.id.clone()),
            )
            .unwrap();
        }

        let first = tree.list_children(&post.id, 2, 0).unwrap();
        let second = tree.list_children(&post.id, 2, 2).unwrap();
        assert_eq!(first[0].content, "reply 0");
        assert_eq!(first[1].content, "reply 1");
        assert_eq!(second[0].content, "reply 2");
        assert_eq!(second[1].content, "reply 3");
    }

    #[test]
    fn test_thread_lineage_same_anchor() {
        let tree = tree();
        let post = make_post(&tree, "alice");

        let a = tree
            .create_sub_thread(&post.id, "alice", "branch a", "", None)
            .unwrap();
        let b = tree
            .create_sub_thread(&post.id, "bob", "branch b", "", Some(a.id.clone()))
            .unwrap();
        let c = tree
            .create_sub_thread(&post.id, "carol", "branch c", "", Some(b.id.clone()))
            .unwrap();
        assert_eq!(c.anchor_post_id, post.id);
    }

    #[test]
    fn test_thread_rejects_foreign_anchor() {
        let tree = tree();
        let post_one = make_post(&tree, "alice");
        let post_two = make_post(&tree, "bob");

        let branch = tree
            .create_sub_thread(&post_one.id, "alice", "branch", "", None)
            .unwrap();

        let result =
            tree.create_sub_thread(&post_two.id, "bob", "hijack", "", Some(branch.id.clone()));
        assert!(matches!(result, Err(FeedError::Validation(_))));
        // Store unchanged for post_two
        assert!(tree.list_threads(&post_two.id).unwrap().is_empty());
    }

    #[test]
    fn test_thread_missing_parent_is_not_found() {
        let tree = tree();
        let post = make_post(&tree, "alice");
        let result = tree.create_sub_thread(
            &post.id,
            "alice",
            "branch",
            "",
            Some("ghost".to_string()),
        );
        assert!(matches!(result, Err(FeedError::NotFound(_))));
    }

    #[test]
    fn test_deep_thread_chain_walks_iteratively() {
        let tree = tree();
        let post = make_post(&tree, "alice");

        let mut parent: Option<String> = None;
        for depth in 0..2_000 {
            let thread = tree
                .create_sub_thread(
                    &post.id,
                    "alice",
                    &format!("depth {}", depth),
                    "",
                    parent.clone(),
                )
                .unwrap();
            parent = Some(thread.id);
        }

        assert_eq!(tree.thread_count(), 2_000);
    }

    #[test]
    fn test_vote_delta_and_badge_count_hooks() {
        let tree = tree();
        let post = make_post(&tree, "alice");

        let (up, down) = tree.apply_vote_delta(&post.id, 2.5, 0.0).unwrap();
        assert!((up - 2.5).abs() < f64::EPSILON);
        assert!(down.abs() < f64::EPSILON);

        let counts = tree
            .increment_badge_count(&post.id, BadgeType::Insightful)
            .unwrap();
        assert_eq!(counts.get(&BadgeType::Insightful), Some(&1));

        assert!(matches!(
            tree.apply_vote_delta("ghost", 1.0, 0.0),
            Err(FeedError::NotFound(_))
        ));
    }
}
