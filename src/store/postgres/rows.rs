//! Row decoding.
//!
//! Column names match the select lists produced by
//! [`crate::query::sql`]; list and detail reads share one decoder per entity.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::error::{ForumError, ForumResult};
use crate::types::{
    Comment, CommentId, CommentPath, Post, PostId, Topic, TopicId, User, UserId, VoteValue,
};

fn vote(row: &PgRow) -> ForumResult<VoteValue> {
    let raw: i16 = row.try_get("my_vote")?;
    VoteValue::try_from(raw).map_err(ForumError::unexpected)
}

/// Decode a post row.
pub(super) fn parse_post(row: &PgRow) -> ForumResult<Post> {
    let pinned: Option<i64> = row.try_get("pinned_comment_id")?;
    let deleted_at: Option<DateTime<Utc>> = row.try_get("deleted_at")?;

    Ok(Post {
        id: PostId::new(row.try_get("id")?),
        topic_id: TopicId::new(row.try_get("topic_id")?),
        title: row.try_get("title")?,
        summary: row.try_get("summary")?,
        content: row.try_get("content")?,
        user_id: UserId::new(row.try_get("user_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        pinned_comment_id: pinned.map(CommentId::new),
        score: row.try_get("score")?,
        no_of_comments: row.try_get("no_of_comments")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at,
        my_vote: vote(row)?,
        topic_name: row.try_get("topic_name")?,
        username: row.try_get("username")?,
    }
    .redact())
}

/// Decode a comment row.
pub(super) fn parse_comment(row: &PgRow) -> ForumResult<Comment> {
    let parent: Option<i64> = row.try_get("parent_id")?;
    // NULL only inside the creating transaction
    let path: Option<String> = row.try_get("path")?;
    let path: CommentPath = path
        .ok_or_else(|| ForumError::Unexpected("comment has no path".into()))?
        .parse()
        .map_err(ForumError::unexpected)?;

    Ok(Comment {
        id: CommentId::new(row.try_get("id")?),
        post_id: PostId::new(row.try_get("post_id")?),
        parent_id: parent.map(CommentId::new),
        path,
        content: row.try_get("content")?,
        summary: row.try_get("summary")?,
        has_long_content: row.try_get("has_long_content")?,
        user_id: UserId::new(row.try_get("user_id")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        score: row.try_get("score")?,
        no_of_replies: row.try_get("no_of_replies")?,
        is_deleted: row.try_get("is_deleted")?,
        deleted_at: row.try_get("deleted_at")?,
        my_vote: vote(row)?,
        post_title: row.try_get("post_title")?,
        username: row.try_get("username")?,
        topic_name: row.try_get("topic_name")?,
    }
    .redact())
}

/// Decode a topic row.
pub(super) fn parse_topic(row: &PgRow) -> ForumResult<Topic> {
    Ok(Topic {
        id: TopicId::new(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        no_of_posts: row.try_get("no_of_posts")?,
        no_of_followers: row.try_get("no_of_followers")?,
        is_following: row.try_get("is_following")?,
    })
}

/// Decode a user row.
pub(super) fn parse_user(row: &PgRow) -> ForumResult<User> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        karma: row.try_get("karma")?,
        created_at: row.try_get("created_at")?,
    })
}
