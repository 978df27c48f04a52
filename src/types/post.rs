//! Post rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::comment::Comment;
use super::ids::{CommentId, PostId, TopicId, UserId};
use super::vote::VoteValue;
use crate::error::{ForumError, ForumResult};

/// A post as seen by a particular viewer.
///
/// List views leave `content` empty and `pinned_comment_id` unset; only the
/// detail read carries them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Post id.
    pub id: PostId,
    /// Owning topic.
    pub topic_id: TopicId,
    /// Title (empty once deleted).
    pub title: String,
    /// Preview of the content (empty once deleted).
    pub summary: String,
    /// Full content (empty once deleted, and in list views).
    pub content: String,
    /// Author.
    pub user_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Pinned top-level comment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pinned_comment_id: Option<CommentId>,
    /// Sum of all votes on the post.
    pub score: i64,
    /// Live comments attached to the post.
    pub no_of_comments: i64,
    /// Tombstone flag.
    pub is_deleted: bool,
    /// Tombstone time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// The viewer's vote (neutral for anonymous viewers).
    pub my_vote: VoteValue,
    /// Owning topic's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
    /// Author's username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Post {
    /// Hide text fields of a deleted post.
    pub fn redact(mut self) -> Self {
        if self.is_deleted {
            self.title.clear();
            self.summary.clear();
            self.content.clear();
        }
        self
    }
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    /// Owning topic.
    pub topic_id: TopicId,
    /// Author.
    pub user_id: UserId,
    /// Title.
    pub title: String,
    /// Content.
    pub content: String,
}

/// Input for editing a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostUpdate {
    /// New title.
    pub title: String,
    /// New content.
    pub content: String,
}

/// Check that `comment` may be pinned on `post_id`: it must belong to the
/// post and be top-level.
///
/// The store's pin operation is a bare field update; callers run this first.
pub fn validate_pin_target(post_id: PostId, comment: &Comment) -> ForumResult<()> {
    if comment.post_id != post_id {
        return Err(ForumError::validation("comment does not belong to this post"));
    }
    if comment.parent_id.is_some() {
        return Err(ForumError::validation("only top-level comments can be pinned"));
    }
    Ok(())
}
