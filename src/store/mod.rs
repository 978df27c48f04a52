//! Storage backends.
//!
//! Every operation of the forum core is a method on one of the component
//! traits below. [`ForumStore`] bundles them for callers (the HTTP service,
//! tests) that need the whole surface.
//!
//! All backends share [`ForumError`](crate::error::ForumError), so callers
//! can map outcomes without knowing which backend produced them. Each
//! multi-statement mutation is atomic: it either commits as a whole or
//! leaves the store untouched.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

use crate::error::ForumResult;
use crate::query::{CommentSort, ListQuery, Paged, PostSort, TopicSort, UserSort};
use crate::types::{
    Comment, CommentId, NewComment, NewPost, NewTopic, NewUser, Post, PostId, PostUpdate,
    ProfileUpdate, Topic, TopicId, TopicSummary, User, UserCredentials, UserId, Viewer,
    VoteTally, VoteValue,
};

/// Hierarchical comment storage.
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Insert a comment, assign its path and bump the post and parent
    /// counters.
    ///
    /// Fails with `NotFound` when the post (top-level comments) or parent
    /// (replies) does not exist, and with `Validation` when the parent
    /// belongs to another post.
    async fn create_comment(&self, new: &NewComment) -> ForumResult<CommentId>;

    /// Replace content and regenerate the summary.
    async fn update_comment(&self, id: CommentId, content: &str) -> ForumResult<()>;

    /// Tombstone a live comment and decrement its post's comment count.
    async fn delete_comment(&self, id: CommentId) -> ForumResult<()>;

    /// Detail read; deleted comments come back as redacted shells.
    async fn get_comment(&self, id: CommentId, viewer: &Viewer) -> ForumResult<Comment>;

    /// Filtered page of comments plus the total.
    async fn list_comments(
        &self,
        query: &ListQuery<CommentSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Comment>>;
}

/// Post storage and pinning.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Insert a post and bump its topic's post count.
    async fn create_post(&self, new: &NewPost) -> ForumResult<PostId>;

    /// Edit a live post.
    async fn update_post(&self, id: PostId, update: &PostUpdate) -> ForumResult<()>;

    /// Tombstone a live post and decrement its topic's post count.
    async fn delete_post(&self, id: PostId) -> ForumResult<()>;

    /// Detail read; deleted posts come back as redacted shells.
    async fn get_post(&self, id: PostId, viewer: &Viewer) -> ForumResult<Post>;

    /// Filtered page of posts plus the total.
    async fn list_posts(&self, query: &ListQuery<PostSort>, viewer: &Viewer)
        -> ForumResult<Paged<Post>>;

    /// Set the pinned comment of a live post.
    ///
    /// This is a bare field update; run
    /// [`validate_pin_target`](crate::types::validate_pin_target) first.
    async fn pin_comment(&self, post_id: PostId, comment_id: CommentId) -> ForumResult<()>;

    /// Clear the pinned comment of a live post.
    async fn unpin_comment(&self, post_id: PostId) -> ForumResult<()>;
}

/// Vote recording with score and karma re-derivation.
#[async_trait]
pub trait VoteStore: Send + Sync {
    /// Record `voter`'s vote on a live post.
    async fn vote_post(&self, voter: UserId, post_id: PostId, value: VoteValue)
        -> ForumResult<VoteTally>;

    /// Record `voter`'s vote on a live comment.
    async fn vote_comment(
        &self,
        voter: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> ForumResult<VoteTally>;
}

/// Topics and the follow graph.
#[async_trait]
pub trait TopicStore: Send + Sync {
    /// Insert a topic; `Conflict` on a duplicate name.
    async fn create_topic(&self, new: &NewTopic) -> ForumResult<TopicId>;

    /// Detail read by exact name.
    async fn get_topic(&self, name: &str, viewer: &Viewer) -> ForumResult<Topic>;

    /// Filtered page of topics plus the total.
    async fn list_topics(&self, query: &ListQuery<TopicSort>, viewer: &Viewer)
        -> ForumResult<Paged<Topic>>;

    /// Every topic as `(id, name)`, ordered by name.
    async fn list_topic_summaries(&self) -> ForumResult<Vec<TopicSummary>>;

    /// Add a follow edge and bump the follower count.
    async fn follow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()>;

    /// Remove a follow edge and decrement the follower count.
    async fn unfollow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a user; `Conflict` when the email or username is taken.
    async fn create_user(&self, new: &NewUser) -> ForumResult<UserId>;

    /// Profile by id, email included.
    async fn get_user(&self, id: UserId) -> ForumResult<User>;

    /// Profile by username, email included.
    async fn get_user_by_username(&self, username: &str) -> ForumResult<User>;

    /// Login projection by email.
    async fn find_credentials(&self, email: &str) -> ForumResult<UserCredentials>;

    /// Change email and username.
    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> ForumResult<()>;

    /// Replace the stored password hash.
    async fn update_password(&self, id: UserId, password_hash: &str) -> ForumResult<()>;

    /// Filtered page of users plus the total.
    async fn list_users(&self, query: &ListQuery<UserSort>, viewer: &Viewer)
        -> ForumResult<Paged<User>>;
}

/// Connection pool statistics for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Current pool size.
    pub size: u32,
    /// Number of idle connections.
    pub idle: usize,
    /// Maximum pool size.
    pub max: u32,
}

/// The full forum surface of one backend.
#[async_trait]
pub trait ForumStore:
    CommentStore + PostStore + VoteStore + TopicStore + UserStore + 'static
{
    /// Whether the backend can serve requests.
    async fn is_healthy(&self) -> bool;

    /// Pool statistics, for backends that pool connections.
    fn pool_stats(&self) -> Option<PoolStats> {
        None
    }
}

pub use memory::InMemoryForumStore;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresForumStore};
