//! Comment rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CommentId, PostId, UserId};
use super::path::CommentPath;
use super::vote::VoteValue;

/// A comment as seen by a particular viewer.
///
/// List views leave `content` empty; `has_long_content` tells the client
/// whether the summary is the whole story or the detail read is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Comment id.
    pub id: CommentId,
    /// Post the comment is attached to.
    pub post_id: PostId,
    /// Parent comment, `None` for top-level comments.
    pub parent_id: Option<CommentId>,
    /// Materialized ancestor chain, self-inclusive.
    pub path: CommentPath,
    /// Full content (empty once deleted, and in list views).
    pub content: String,
    /// Preview (empty once deleted).
    pub summary: String,
    /// Whether `summary` was truncated.
    pub has_long_content: bool,
    /// Author.
    pub user_id: UserId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
    /// Sum of all votes on the comment.
    pub score: i64,
    /// Direct replies.
    pub no_of_replies: i64,
    /// Tombstone flag.
    pub is_deleted: bool,
    /// Tombstone time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// The viewer's vote (neutral for anonymous viewers).
    pub my_vote: VoteValue,
    /// Title of the owning post, when requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_title: Option<String>,
    /// Author's username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Name of the owning post's topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_name: Option<String>,
}

impl Comment {
    /// Whether the comment starts a thread.
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Hide text fields of a deleted comment.
    pub fn redact(mut self) -> Self {
        if self.is_deleted {
            self.content.clear();
            self.summary.clear();
        }
        self
    }
}

/// Input for creating a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    /// Post to attach to.
    pub post_id: PostId,
    /// Parent comment for replies.
    pub parent_id: Option<CommentId>,
    /// Author.
    pub user_id: UserId,
    /// Content.
    pub content: String,
}
