//! In-memory forum store for tests and embedding.
//!
//! All tables live behind one mutex. Writers clone the tables, apply the
//! mutation to the copy, and swap it in only when the mutation succeeded, so
//! a failed operation leaves nothing behind. Iteration uses `BTreeMap`s, so
//! results are deterministic.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::{CommentStore, ForumStore, PostStore, TopicStore, UserStore, VoteStore};
use crate::error::{ForumError, ForumResult};
use crate::query::{
    CommentSort, Field, ListQuery, Paged, PostSort, PredicateContext, RowView, SortKey,
    TopicSort, UserSort,
};
use crate::types::{
    Comment, CommentId, CommentPath, NewComment, NewPost, NewTopic, NewUser, Post, PostId,
    PostUpdate, ProfileUpdate, Summary, Topic, TopicId, TopicSummary, User, UserCredentials,
    UserId, UserTopic, Viewer, VoteTally, VoteValue,
};

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, Clone)]
struct UserRow {
    id: UserId,
    email: String,
    username: String,
    password_hash: String,
    karma: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TopicRow {
    id: TopicId,
    name: String,
    description: String,
    no_of_posts: i64,
    no_of_followers: i64,
}

#[derive(Debug, Clone)]
struct PostRow {
    id: PostId,
    topic_id: TopicId,
    title: String,
    content: String,
    summary: String,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    pinned_comment_id: Option<CommentId>,
    score: i64,
    no_of_comments: i64,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct CommentRow {
    id: CommentId,
    post_id: PostId,
    parent_id: Option<CommentId>,
    path: CommentPath,
    content: String,
    summary: String,
    has_long_content: bool,
    user_id: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    score: i64,
    no_of_replies: i64,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
}

impl RowView for UserRow {
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn int(&self, field: Field) -> Option<i64> {
        match field {
            Field::Id => Some(self.id.get()),
            Field::Karma => Some(self.karma),
            _ => None,
        }
    }
    fn text(&self, field: Field) -> Option<&str> {
        (field == Field::Username).then_some(self.username.as_str())
    }
    fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        (field == Field::CreatedAt).then_some(self.created_at)
    }
}

impl RowView for TopicRow {
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn int(&self, field: Field) -> Option<i64> {
        match field {
            Field::Id => Some(self.id.get()),
            Field::NoOfPosts => Some(self.no_of_posts),
            Field::NoOfFollowers => Some(self.no_of_followers),
            _ => None,
        }
    }
    fn text(&self, field: Field) -> Option<&str> {
        (field == Field::Name).then_some(self.name.as_str())
    }
    fn time(&self, _field: Field) -> Option<DateTime<Utc>> {
        None
    }
    fn topic_id(&self) -> Option<TopicId> {
        Some(self.id)
    }
}

impl RowView for PostRow {
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn int(&self, field: Field) -> Option<i64> {
        match field {
            Field::Id => Some(self.id.get()),
            Field::TopicId => Some(self.topic_id.get()),
            Field::UserId => Some(self.user_id.get()),
            Field::Score => Some(self.score),
            Field::NoOfComments => Some(self.no_of_comments),
            _ => None,
        }
    }
    fn text(&self, field: Field) -> Option<&str> {
        (field == Field::Title).then_some(self.title.as_str())
    }
    fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        (field == Field::CreatedAt).then_some(self.created_at)
    }
    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
    fn topic_id(&self) -> Option<TopicId> {
        Some(self.topic_id)
    }
}

impl RowView for CommentRow {
    fn id(&self) -> i64 {
        self.id.get()
    }
    fn int(&self, field: Field) -> Option<i64> {
        match field {
            Field::Id => Some(self.id.get()),
            Field::PostId => Some(self.post_id.get()),
            Field::UserId => Some(self.user_id.get()),
            Field::ParentId => self.parent_id.map(|p| p.get()),
            Field::Score => Some(self.score),
            _ => None,
        }
    }
    fn text(&self, field: Field) -> Option<&str> {
        (field == Field::Content).then_some(self.content.as_str())
    }
    fn time(&self, field: Field) -> Option<DateTime<Utc>> {
        (field == Field::CreatedAt).then_some(self.created_at)
    }
    fn is_deleted(&self) -> bool {
        self.is_deleted
    }
    fn path(&self) -> Option<&CommentPath> {
        Some(&self.path)
    }
}

// ============================================================================
// Tables
// ============================================================================

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i64,
    topic: i64,
    post: i64,
    comment: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, UserRow>,
    topics: BTreeMap<TopicId, TopicRow>,
    posts: BTreeMap<PostId, PostRow>,
    comments: BTreeMap<CommentId, CommentRow>,
    post_votes: BTreeMap<(PostId, UserId), VoteValue>,
    comment_votes: BTreeMap<(CommentId, UserId), VoteValue>,
    follows: BTreeSet<UserTopic>,
    seq: Sequences,
}

impl PredicateContext for Tables {
    fn follows(&self, user: UserId, topic: TopicId) -> bool {
        self.follows.contains(&UserTopic {
            user_id: user,
            topic_id: topic,
        })
    }

    fn comment_path(&self, id: CommentId) -> Option<CommentPath> {
        self.comments.get(&id).map(|c| c.path.clone())
    }
}

impl Tables {
    fn topic_by_name(&self, name: &str) -> Option<&TopicRow> {
        self.topics.values().find(|t| t.name == name)
    }

    fn username(&self, id: UserId) -> Option<String> {
        self.users.get(&id).map(|u| u.username.clone())
    }

    fn topic_name(&self, id: TopicId) -> Option<String> {
        self.topics.get(&id).map(|t| t.name.clone())
    }

    fn check_user_unique(&self, email: &str, username: &str, except: Option<UserId>) -> ForumResult<()> {
        for user in self.users.values() {
            if Some(user.id) == except {
                continue;
            }
            if user.email == email {
                return Err(ForumError::Conflict("users_email_key".into()));
            }
            if user.username == username {
                return Err(ForumError::Conflict("users_username_key".into()));
            }
        }
        Ok(())
    }

    /// Karma = scores of everything the user authored, deleted or not.
    fn recompute_karma(&mut self, author: UserId) -> i64 {
        let from_posts: i64 = self
            .posts
            .values()
            .filter(|p| p.user_id == author)
            .map(|p| p.score)
            .sum();
        let from_comments: i64 = self
            .comments
            .values()
            .filter(|c| c.user_id == author)
            .map(|c| c.score)
            .sum();
        let karma = from_posts + from_comments;
        if let Some(user) = self.users.get_mut(&author) {
            user.karma = karma;
        }
        karma
    }

    fn post_view(&self, row: &PostRow, viewer: &Viewer, detail: bool) -> Post {
        let my_vote = viewer
            .user_id()
            .and_then(|u| self.post_votes.get(&(row.id, u)).copied())
            .unwrap_or(VoteValue::Neutral);
        Post {
            id: row.id,
            topic_id: row.topic_id,
            title: row.title.clone(),
            summary: row.summary.clone(),
            content: if detail { row.content.clone() } else { String::new() },
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            pinned_comment_id: if detail { row.pinned_comment_id } else { None },
            score: row.score,
            no_of_comments: row.no_of_comments,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            my_vote,
            topic_name: self.topic_name(row.topic_id),
            username: self.username(row.user_id),
        }
        .redact()
    }

    fn comment_view(&self, row: &CommentRow, viewer: &Viewer, detail: bool) -> Comment {
        let my_vote = viewer
            .user_id()
            .and_then(|u| self.comment_votes.get(&(row.id, u)).copied())
            .unwrap_or(VoteValue::Neutral);
        let post = self.posts.get(&row.post_id);
        Comment {
            id: row.id,
            post_id: row.post_id,
            parent_id: row.parent_id,
            path: row.path.clone(),
            content: if detail { row.content.clone() } else { String::new() },
            summary: row.summary.clone(),
            has_long_content: row.has_long_content,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            score: row.score,
            no_of_replies: row.no_of_replies,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            my_vote,
            post_title: post.map(|p| {
                if p.is_deleted {
                    String::new()
                } else {
                    p.title.clone()
                }
            }),
            username: self.username(row.user_id),
            topic_name: post.and_then(|p| self.topic_name(p.topic_id)),
        }
        .redact()
    }

    fn topic_view(&self, row: &TopicRow, viewer: &Viewer) -> Topic {
        Topic {
            id: row.id,
            name: row.name.clone(),
            description: row.description.clone(),
            no_of_posts: row.no_of_posts,
            no_of_followers: row.no_of_followers,
            is_following: viewer
                .user_id()
                .map(|u| self.follows(u, row.id))
                .unwrap_or(false),
        }
    }

    fn user_view(row: &UserRow, detail: bool) -> User {
        User {
            id: row.id,
            username: row.username.clone(),
            email: if detail { row.email.clone() } else { String::new() },
            karma: row.karma,
            created_at: row.created_at,
        }
    }
}

fn select<'a, S, R>(
    query: &ListQuery<S>,
    rows: impl IntoIterator<Item = &'a R>,
    tables: &Tables,
) -> ForumResult<Paged<&'a R>>
where
    S: SortKey,
    R: RowView + 'a,
{
    query.validate()?;
    Ok(query.select(rows, tables))
}

// ============================================================================
// Store
// ============================================================================

/// In-memory forum store.
///
/// Every mutation works on a staged copy of all tables, which makes writes
/// O(size of store). Intended for tests, fixtures and small embedded uses.
#[derive(Debug, Default)]
pub struct InMemoryForumStore {
    tables: Mutex<Tables>,
}

impl InMemoryForumStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against a staged copy; commit only on `Ok`.
    fn transaction<T>(&self, f: impl FnOnce(&mut Tables) -> ForumResult<T>) -> ForumResult<T> {
        let mut guard = self.tables.lock();
        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        *guard = staged;
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> ForumResult<T>) -> ForumResult<T> {
        let guard = self.tables.lock();
        f(&guard)
    }

    /// Number of vote rows on a post, including withdrawn (neutral) votes.
    pub fn post_vote_rows(&self, post_id: PostId) -> usize {
        self.tables
            .lock()
            .post_votes
            .keys()
            .filter(|(p, _)| *p == post_id)
            .count()
    }

    /// Number of vote rows on a comment, including withdrawn (neutral) votes.
    pub fn comment_vote_rows(&self, comment_id: CommentId) -> usize {
        self.tables
            .lock()
            .comment_votes
            .keys()
            .filter(|(c, _)| *c == comment_id)
            .count()
    }
}

#[async_trait]
impl CommentStore for InMemoryForumStore {
    async fn create_comment(&self, new: &NewComment) -> ForumResult<CommentId> {
        let id = self.transaction(|t| {
            let parent_path = match new.parent_id {
                None => {
                    match t.posts.get(&new.post_id) {
                        Some(post) if !post.is_deleted => {}
                        _ => return Err(ForumError::NotFound),
                    }
                    None
                }
                Some(parent_id) => {
                    let parent = t.comments.get(&parent_id).ok_or(ForumError::NotFound)?;
                    if parent.post_id != new.post_id {
                        return Err(ForumError::validation(
                            "parent comment belongs to another post",
                        ));
                    }
                    Some(parent.path.clone())
                }
            };

            let id = CommentId::new(next(&mut t.seq.comment));
            let now = Utc::now();
            let summary = Summary::for_comment(&new.content);
            t.comments.insert(
                id,
                CommentRow {
                    id,
                    post_id: new.post_id,
                    parent_id: new.parent_id,
                    path: CommentPath::for_new_comment(parent_path.as_ref(), id),
                    content: new.content.clone(),
                    summary: summary.text,
                    has_long_content: summary.truncated,
                    user_id: new.user_id,
                    created_at: now,
                    updated_at: now,
                    score: 0,
                    no_of_replies: 0,
                    is_deleted: false,
                    deleted_at: None,
                },
            );

            t.posts
                .get_mut(&new.post_id)
                .ok_or(ForumError::NotFound)?
                .no_of_comments += 1;
            if let Some(parent_id) = new.parent_id {
                if let Some(parent) = t.comments.get_mut(&parent_id) {
                    parent.no_of_replies += 1;
                }
            }
            Ok(id)
        })?;

        tracing::debug!(comment_id = %id, post_id = %new.post_id, "Comment created");
        Ok(id)
    }

    async fn update_comment(&self, id: CommentId, content: &str) -> ForumResult<()> {
        self.transaction(|t| {
            let row = t.comments.get_mut(&id).ok_or(ForumError::NoRowsAffected)?;
            let summary = Summary::for_comment(content);
            row.content = content.to_string();
            row.summary = summary.text;
            row.has_long_content = summary.truncated;
            row.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn delete_comment(&self, id: CommentId) -> ForumResult<()> {
        self.transaction(|t| {
            let row = match t.comments.get_mut(&id) {
                Some(row) if !row.is_deleted => row,
                _ => return Err(ForumError::NoRowsAffected),
            };
            row.is_deleted = true;
            row.deleted_at = Some(Utc::now());
            let post_id = row.post_id;
            if let Some(post) = t.posts.get_mut(&post_id) {
                post.no_of_comments -= 1;
            }
            Ok(())
        })?;
        tracing::debug!(comment_id = %id, "Comment soft-deleted");
        Ok(())
    }

    async fn get_comment(&self, id: CommentId, viewer: &Viewer) -> ForumResult<Comment> {
        self.read(|t| {
            let row = t.comments.get(&id).ok_or(ForumError::NotFound)?;
            Ok(t.comment_view(row, viewer, true))
        })
    }

    async fn list_comments(
        &self,
        query: &ListQuery<CommentSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Comment>> {
        self.read(|t| {
            Ok(select(query, t.comments.values(), t)?.map(|row| t.comment_view(row, viewer, false)))
        })
    }
}

#[async_trait]
impl PostStore for InMemoryForumStore {
    async fn create_post(&self, new: &NewPost) -> ForumResult<PostId> {
        let id = self.transaction(|t| {
            let topic = t.topics.get_mut(&new.topic_id).ok_or(ForumError::NotFound)?;
            topic.no_of_posts += 1;

            let id = PostId::new(next(&mut t.seq.post));
            let now = Utc::now();
            t.posts.insert(
                id,
                PostRow {
                    id,
                    topic_id: new.topic_id,
                    title: new.title.clone(),
                    content: new.content.clone(),
                    summary: Summary::for_post(&new.content).text,
                    user_id: new.user_id,
                    created_at: now,
                    updated_at: now,
                    pinned_comment_id: None,
                    score: 0,
                    no_of_comments: 0,
                    is_deleted: false,
                    deleted_at: None,
                },
            );
            Ok(id)
        })?;
        tracing::debug!(post_id = %id, topic_id = %new.topic_id, "Post created");
        Ok(id)
    }

    async fn update_post(&self, id: PostId, update: &PostUpdate) -> ForumResult<()> {
        self.transaction(|t| match t.posts.get_mut(&id) {
            Some(row) if !row.is_deleted => {
                row.title = update.title.clone();
                row.content = update.content.clone();
                row.summary = Summary::for_post(&update.content).text;
                row.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(ForumError::NoRowsAffected),
        })
    }

    async fn delete_post(&self, id: PostId) -> ForumResult<()> {
        self.transaction(|t| {
            let row = match t.posts.get_mut(&id) {
                Some(row) if !row.is_deleted => row,
                _ => return Err(ForumError::NoRowsAffected),
            };
            row.is_deleted = true;
            row.deleted_at = Some(Utc::now());
            let topic_id = row.topic_id;
            if let Some(topic) = t.topics.get_mut(&topic_id) {
                topic.no_of_posts -= 1;
            }
            Ok(())
        })?;
        tracing::debug!(post_id = %id, "Post soft-deleted");
        Ok(())
    }

    async fn get_post(&self, id: PostId, viewer: &Viewer) -> ForumResult<Post> {
        self.read(|t| {
            let row = t.posts.get(&id).ok_or(ForumError::NotFound)?;
            Ok(t.post_view(row, viewer, true))
        })
    }

    async fn list_posts(
        &self,
        query: &ListQuery<PostSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Post>> {
        self.read(|t| {
            Ok(select(query, t.posts.values(), t)?.map(|row| t.post_view(row, viewer, false)))
        })
    }

    async fn pin_comment(&self, post_id: PostId, comment_id: CommentId) -> ForumResult<()> {
        self.transaction(|t| match t.posts.get_mut(&post_id) {
            Some(row) if !row.is_deleted => {
                row.pinned_comment_id = Some(comment_id);
                Ok(())
            }
            _ => Err(ForumError::NoRowsAffected),
        })
    }

    async fn unpin_comment(&self, post_id: PostId) -> ForumResult<()> {
        self.transaction(|t| match t.posts.get_mut(&post_id) {
            Some(row) if !row.is_deleted => {
                row.pinned_comment_id = None;
                Ok(())
            }
            _ => Err(ForumError::NoRowsAffected),
        })
    }
}

#[async_trait]
impl VoteStore for InMemoryForumStore {
    async fn vote_post(
        &self,
        voter: UserId,
        post_id: PostId,
        value: VoteValue,
    ) -> ForumResult<VoteTally> {
        let tally = self.transaction(|t| {
            let author_id = match t.posts.get(&post_id) {
                Some(row) if !row.is_deleted => row.user_id,
                _ => return Err(ForumError::NoRowsAffected),
            };
            t.post_votes.insert((post_id, voter), value);

            let score: i64 = t
                .post_votes
                .range((post_id, UserId::new(i64::MIN))..=(post_id, UserId::new(i64::MAX)))
                .map(|(_, v)| i64::from(v.weight()))
                .sum();
            if let Some(row) = t.posts.get_mut(&post_id) {
                row.score = score;
            }
            let author_karma = t.recompute_karma(author_id);
            Ok(VoteTally {
                score,
                author_id,
                author_karma,
            })
        })?;
        tracing::debug!(post_id = %post_id, voter = %voter, score = tally.score, "Post vote recorded");
        Ok(tally)
    }

    async fn vote_comment(
        &self,
        voter: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> ForumResult<VoteTally> {
        let tally = self.transaction(|t| {
            let author_id = match t.comments.get(&comment_id) {
                Some(row) if !row.is_deleted => row.user_id,
                _ => return Err(ForumError::NoRowsAffected),
            };
            t.comment_votes.insert((comment_id, voter), value);

            let score: i64 = t
                .comment_votes
                .range((comment_id, UserId::new(i64::MIN))..=(comment_id, UserId::new(i64::MAX)))
                .map(|(_, v)| i64::from(v.weight()))
                .sum();
            if let Some(row) = t.comments.get_mut(&comment_id) {
                row.score = score;
            }
            let author_karma = t.recompute_karma(author_id);
            Ok(VoteTally {
                score,
                author_id,
                author_karma,
            })
        })?;
        tracing::debug!(comment_id = %comment_id, voter = %voter, score = tally.score, "Comment vote recorded");
        Ok(tally)
    }
}

#[async_trait]
impl TopicStore for InMemoryForumStore {
    async fn create_topic(&self, new: &NewTopic) -> ForumResult<TopicId> {
        self.transaction(|t| {
            if t.topic_by_name(&new.name).is_some() {
                return Err(ForumError::Conflict("topics_name_key".into()));
            }
            let id = TopicId::new(next(&mut t.seq.topic));
            t.topics.insert(
                id,
                TopicRow {
                    id,
                    name: new.name.clone(),
                    description: new.description.clone(),
                    no_of_posts: 0,
                    no_of_followers: 0,
                },
            );
            Ok(id)
        })
    }

    async fn get_topic(&self, name: &str, viewer: &Viewer) -> ForumResult<Topic> {
        self.read(|t| {
            let row = t.topic_by_name(name).ok_or(ForumError::NotFound)?;
            Ok(t.topic_view(row, viewer))
        })
    }

    async fn list_topics(
        &self,
        query: &ListQuery<TopicSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Topic>> {
        self.read(|t| Ok(select(query, t.topics.values(), t)?.map(|row| t.topic_view(row, viewer))))
    }

    async fn list_topic_summaries(&self) -> ForumResult<Vec<TopicSummary>> {
        self.read(|t| {
            let mut summaries: Vec<TopicSummary> = t
                .topics
                .values()
                .map(|row| TopicSummary {
                    id: row.id,
                    name: row.name.clone(),
                })
                .collect();
            summaries.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            Ok(summaries)
        })
    }

    async fn follow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()> {
        self.transaction(|t| {
            let topic_id = t.topic_by_name(topic_name).ok_or(ForumError::NotFound)?.id;
            if !t.follows.insert(UserTopic { user_id, topic_id }) {
                return Err(ForumError::NoRowsAffected);
            }
            if let Some(topic) = t.topics.get_mut(&topic_id) {
                topic.no_of_followers += 1;
            }
            Ok(())
        })
    }

    async fn unfollow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()> {
        self.transaction(|t| {
            let topic_id = t.topic_by_name(topic_name).ok_or(ForumError::NotFound)?.id;
            if !t.follows.remove(&UserTopic { user_id, topic_id }) {
                return Err(ForumError::NoRowsAffected);
            }
            if let Some(topic) = t.topics.get_mut(&topic_id) {
                topic.no_of_followers -= 1;
            }
            Ok(())
        })
    }
}

#[async_trait]
impl UserStore for InMemoryForumStore {
    async fn create_user(&self, new: &NewUser) -> ForumResult<UserId> {
        self.transaction(|t| {
            t.check_user_unique(&new.email, &new.username, None)?;
            let id = UserId::new(next(&mut t.seq.user));
            t.users.insert(
                id,
                UserRow {
                    id,
                    email: new.email.clone(),
                    username: new.username.clone(),
                    password_hash: new.password_hash.clone(),
                    karma: 0,
                    created_at: Utc::now(),
                },
            );
            Ok(id)
        })
    }

    async fn get_user(&self, id: UserId) -> ForumResult<User> {
        self.read(|t| {
            let row = t.users.get(&id).ok_or(ForumError::NotFound)?;
            Ok(Tables::user_view(row, true))
        })
    }

    async fn get_user_by_username(&self, username: &str) -> ForumResult<User> {
        self.read(|t| {
            let row = t
                .users
                .values()
                .find(|u| u.username == username)
                .ok_or(ForumError::NotFound)?;
            Ok(Tables::user_view(row, true))
        })
    }

    async fn find_credentials(&self, email: &str) -> ForumResult<UserCredentials> {
        self.read(|t| {
            let row = t
                .users
                .values()
                .find(|u| u.email == email)
                .ok_or(ForumError::NotFound)?;
            Ok(UserCredentials {
                id: row.id,
                username: row.username.clone(),
                email: row.email.clone(),
                password_hash: row.password_hash.clone(),
            })
        })
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> ForumResult<()> {
        self.transaction(|t| {
            if !t.users.contains_key(&id) {
                return Err(ForumError::NoRowsAffected);
            }
            t.check_user_unique(&update.email, &update.username, Some(id))?;
            if let Some(row) = t.users.get_mut(&id) {
                row.email = update.email.clone();
                row.username = update.username.clone();
            }
            Ok(())
        })
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> ForumResult<()> {
        self.transaction(|t| {
            let row = t.users.get_mut(&id).ok_or(ForumError::NoRowsAffected)?;
            row.password_hash = password_hash.to_string();
            Ok(())
        })
    }

    async fn list_users(
        &self,
        query: &ListQuery<UserSort>,
        _viewer: &Viewer,
    ) -> ForumResult<Paged<User>> {
        self.read(|t| Ok(select(query, t.users.values(), t)?.map(|row| Tables::user_view(row, false))))
    }
}

#[async_trait]
impl ForumStore for InMemoryForumStore {
    async fn is_healthy(&self) -> bool {
        true
    }
}
