//! Filter predicates shared by every backend.
//!
//! A [`Predicate`] is a backend-neutral description of one filter. The
//! PostgreSQL backend renders it into a parameterized `WHERE` fragment
//! (see [`super::sql`]); the in-memory backend evaluates it directly through
//! [`Predicate::matches`]. Both read the same list, so the two backends agree
//! on which rows a listing contains.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CommentId, CommentPath, TopicId, UserId};

/// Entity a listing runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// `posts`
    Posts,
    /// `comments`
    Comments,
    /// `topics`
    Topics,
    /// `users`
    Users,
}

impl Entity {
    /// Backing table.
    pub fn table(&self) -> &'static str {
        match self {
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::Topics => "topics",
            Self::Users => "users",
        }
    }

    /// SQL alias used for the main table in rendered queries.
    pub fn alias(&self) -> &'static str {
        match self {
            Self::Posts => "p",
            Self::Comments => "c",
            Self::Topics => "t",
            Self::Users => "u",
        }
    }

    /// Whether `field` is a column of this entity.
    pub fn supports(&self, field: Field) -> bool {
        use Field::*;
        match self {
            Self::Posts => matches!(
                field,
                Id | Title | TopicId | UserId | CreatedAt | Score | NoOfComments
            ),
            Self::Comments => matches!(
                field,
                Id | Content | PostId | UserId | ParentId | CreatedAt | Score
            ),
            Self::Topics => matches!(field, Id | Name | NoOfPosts | NoOfFollowers),
            Self::Users => matches!(field, Id | Username | CreatedAt | Karma),
        }
    }

    /// Text column free-text search runs against.
    pub fn search_field(&self) -> Field {
        match self {
            Self::Posts => Field::Title,
            Self::Comments => Field::Content,
            Self::Topics => Field::Name,
            Self::Users => Field::Username,
        }
    }

    /// Whether rows of this entity can be tombstoned.
    pub fn has_tombstones(&self) -> bool {
        matches!(self, Self::Posts | Self::Comments)
    }
}

/// A filterable or sortable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Primary key.
    Id,
    /// Post title.
    Title,
    /// Comment content.
    Content,
    /// Topic name.
    Name,
    /// Username.
    Username,
    /// Owning post.
    PostId,
    /// Owning topic.
    TopicId,
    /// Author / owner.
    UserId,
    /// Parent comment.
    ParentId,
    /// Creation time.
    CreatedAt,
    /// Vote score.
    Score,
    /// Post comment counter.
    NoOfComments,
    /// Topic post counter.
    NoOfPosts,
    /// Topic follower counter.
    NoOfFollowers,
    /// User karma.
    Karma,
}

impl Field {
    /// Column name.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Title => "title",
            Self::Content => "content",
            Self::Name => "name",
            Self::Username => "username",
            Self::PostId => "post_id",
            Self::TopicId => "topic_id",
            Self::UserId => "user_id",
            Self::ParentId => "parent_id",
            Self::CreatedAt => "created_at",
            Self::Score => "score",
            Self::NoOfComments => "no_of_comments",
            Self::NoOfPosts => "no_of_posts",
            Self::NoOfFollowers => "no_of_followers",
            Self::Karma => "karma",
        }
    }

    /// Whether the column holds text (searchable).
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Title | Self::Content | Self::Name | Self::Username)
    }
}

/// One conjunct of a listing's `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Case-insensitive literal substring match on a text column.
    Contains {
        /// Text column.
        field: Field,
        /// Substring to look for; wildcard characters match literally.
        needle: String,
    },
    /// Equality on an id column.
    Equals {
        /// Id column.
        field: Field,
        /// Expected raw id.
        value: i64,
    },
    /// Column is NULL (e.g. top-level comments).
    IsNull {
        /// Nullable column.
        field: Field,
    },
    /// Exclude tombstoned rows.
    NotDeleted,
    /// Row's topic is followed by the user.
    FollowedBy {
        /// Follower.
        user_id: UserId,
    },
    /// Comment lies strictly beneath the given comment.
    DescendantOf {
        /// Subtree root (excluded from the match).
        comment_id: CommentId,
    },
}

impl Predicate {
    /// Whether the predicate makes sense for `entity`.
    pub fn applies_to(&self, entity: Entity) -> bool {
        match self {
            Self::Contains { field, .. } => field.is_text() && entity.supports(*field),
            Self::Equals { field, .. } => !field.is_text() && entity.supports(*field),
            Self::IsNull { field } => *field == Field::ParentId && entity.supports(*field),
            Self::NotDeleted => entity.has_tombstones(),
            Self::FollowedBy { .. } => matches!(entity, Entity::Posts | Entity::Topics),
            Self::DescendantOf { .. } => entity == Entity::Comments,
        }
    }

    /// Evaluate against an in-memory row.
    pub fn matches<R, C>(&self, row: &R, ctx: &C) -> bool
    where
        R: RowView + ?Sized,
        C: PredicateContext + ?Sized,
    {
        match self {
            Self::Contains { field, needle } => row
                .text(*field)
                .map(|text| text.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
            Self::Equals { field, value } => row.int(*field) == Some(*value),
            Self::IsNull { field } => row.int(*field).is_none(),
            Self::NotDeleted => !row.is_deleted(),
            Self::FollowedBy { user_id } => row
                .topic_id()
                .map(|topic| ctx.follows(*user_id, topic))
                .unwrap_or(false),
            Self::DescendantOf { comment_id } => {
                match (row.path(), ctx.comment_path(*comment_id)) {
                    (Some(path), Some(root)) => path.is_descendant_of(&root),
                    _ => false,
                }
            }
        }
    }
}

/// Read access to an in-memory row for predicate evaluation and sorting.
pub trait RowView {
    /// Primary key.
    fn id(&self) -> i64;
    /// Integer (id/counter) column; `None` means NULL.
    fn int(&self, field: Field) -> Option<i64>;
    /// Text column.
    fn text(&self, field: Field) -> Option<&str>;
    /// Timestamp column.
    fn time(&self, field: Field) -> Option<DateTime<Utc>>;
    /// Tombstone flag (false for entities without tombstones).
    fn is_deleted(&self) -> bool {
        false
    }
    /// Topic the row belongs to (posts: owning topic; topics: itself).
    fn topic_id(&self) -> Option<TopicId> {
        None
    }
    /// Materialized path (comments only).
    fn path(&self) -> Option<&CommentPath> {
        None
    }

    /// Value used when ordering by `field`.
    fn sort_value(&self, field: Field) -> SortValue {
        if field == Field::CreatedAt {
            return self.time(field).map(SortValue::Time).unwrap_or(SortValue::Null);
        }
        if field.is_text() {
            return self
                .text(field)
                .map(|s| SortValue::Text(s.to_string()))
                .unwrap_or(SortValue::Null);
        }
        self.int(field).map(SortValue::Int).unwrap_or(SortValue::Null)
    }
}

/// Lookups a predicate may need beyond the row itself.
pub trait PredicateContext {
    /// Whether `user` follows `topic`.
    fn follows(&self, user: UserId, topic: TopicId) -> bool;
    /// Path of an existing comment.
    fn comment_path(&self, id: CommentId) -> Option<CommentPath>;
}

/// Comparable sort value extracted from a row.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    /// SQL NULL.
    Null,
    /// Integer column.
    Int(i64),
    /// Text column.
    Text(String),
    /// Timestamp column.
    Time(DateTime<Utc>),
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row {
        id: i64,
        title: String,
        parent: Option<i64>,
        deleted: bool,
        topic: i64,
        path: Option<CommentPath>,
    }

    impl RowView for Row {
        fn id(&self) -> i64 {
            self.id
        }
        fn int(&self, field: Field) -> Option<i64> {
            match field {
                Field::Id => Some(self.id),
                Field::ParentId => self.parent,
                Field::TopicId => Some(self.topic),
                _ => None,
            }
        }
        fn text(&self, field: Field) -> Option<&str> {
            (field == Field::Title).then_some(self.title.as_str())
        }
        fn time(&self, _field: Field) -> Option<DateTime<Utc>> {
            None
        }
        fn is_deleted(&self) -> bool {
            self.deleted
        }
        fn topic_id(&self) -> Option<TopicId> {
            Some(TopicId::new(self.topic))
        }
        fn path(&self) -> Option<&CommentPath> {
            self.path.as_ref()
        }
    }

    struct Ctx;

    impl PredicateContext for Ctx {
        fn follows(&self, user: UserId, topic: TopicId) -> bool {
            user.get() == 1 && topic.get() == 10
        }
        fn comment_path(&self, id: CommentId) -> Option<CommentPath> {
            (id.get() == 5).then(|| "5".parse().unwrap())
        }
    }

    fn row() -> Row {
        Row {
            id: 7,
            title: "Borrow Checker Tips".into(),
            parent: None,
            deleted: false,
            topic: 10,
            path: Some("5.7".parse().unwrap()),
        }
    }

    #[test]
    fn test_contains_is_case_insensitive_and_literal() {
        let p = Predicate::Contains { field: Field::Title, needle: "checker".into() };
        assert!(p.matches(&row(), &Ctx));
        let wildcard = Predicate::Contains { field: Field::Title, needle: "b%r".into() };
        assert!(!wildcard.matches(&row(), &Ctx));
    }

    #[test]
    fn test_null_and_equality() {
        assert!(Predicate::IsNull { field: Field::ParentId }.matches(&row(), &Ctx));
        assert!(Predicate::Equals { field: Field::TopicId, value: 10 }.matches(&row(), &Ctx));
        assert!(!Predicate::Equals { field: Field::TopicId, value: 11 }.matches(&row(), &Ctx));
    }

    #[test]
    fn test_follow_and_subtree() {
        assert!(Predicate::FollowedBy { user_id: UserId::new(1) }.matches(&row(), &Ctx));
        assert!(!Predicate::FollowedBy { user_id: UserId::new(2) }.matches(&row(), &Ctx));
        assert!(Predicate::DescendantOf { comment_id: CommentId::new(5) }.matches(&row(), &Ctx));
        assert!(!Predicate::DescendantOf { comment_id: CommentId::new(6) }.matches(&row(), &Ctx));
    }

    #[test]
    fn test_applicability() {
        assert!(Predicate::NotDeleted.applies_to(Entity::Posts));
        assert!(!Predicate::NotDeleted.applies_to(Entity::Topics));
        assert!(!Predicate::Contains { field: Field::Title, needle: "x".into() }
            .applies_to(Entity::Comments));
        assert!(!Predicate::DescendantOf { comment_id: CommentId::new(1) }
            .applies_to(Entity::Posts));
        assert!(!Predicate::FollowedBy { user_id: UserId::new(1) }.applies_to(Entity::Users));
    }
}
