//! Enumerated sort keys and directions.
//!
//! Each entity has its own closed set of sort keys, so an unknown key is a
//! deserialization error rather than a silently ignored string.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Debug;

use super::predicate::{Entity, Field};

/// Ordering direction. Listings default to newest/highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    #[serde(rename = "asc")]
    Ascending,
    /// Largest first.
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// SQL keyword.
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Orient an ascending comparison.
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// A sort key for one entity.
pub trait SortKey: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    /// Entity this key sorts.
    const ENTITY: Entity;

    /// Column the key orders by.
    fn field(&self) -> Field;
}

/// Post ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PostSort {
    /// Creation time.
    #[default]
    #[serde(rename = "created_at")]
    CreatedAt,
    /// Vote score.
    #[serde(rename = "score")]
    Score,
    /// Comment count.
    #[serde(rename = "no_of_comments")]
    Comments,
}

impl SortKey for PostSort {
    const ENTITY: Entity = Entity::Posts;

    fn field(&self) -> Field {
        match self {
            Self::CreatedAt => Field::CreatedAt,
            Self::Score => Field::Score,
            Self::Comments => Field::NoOfComments,
        }
    }
}

/// Comment ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommentSort {
    /// Creation time.
    #[default]
    #[serde(rename = "created_at")]
    CreatedAt,
    /// Vote score.
    #[serde(rename = "score")]
    Score,
}

impl SortKey for CommentSort {
    const ENTITY: Entity = Entity::Comments;

    fn field(&self) -> Field {
        match self {
            Self::CreatedAt => Field::CreatedAt,
            Self::Score => Field::Score,
        }
    }
}

/// Topic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TopicSort {
    /// Name.
    #[default]
    #[serde(rename = "name")]
    Name,
    /// Post count.
    #[serde(rename = "no_of_posts")]
    Posts,
    /// Follower count.
    #[serde(rename = "no_of_followers")]
    Followers,
}

impl SortKey for TopicSort {
    const ENTITY: Entity = Entity::Topics;

    fn field(&self) -> Field {
        match self {
            Self::Name => Field::Name,
            Self::Posts => Field::NoOfPosts,
            Self::Followers => Field::NoOfFollowers,
        }
    }
}

/// User ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UserSort {
    /// Registration time.
    #[default]
    #[serde(rename = "created_at")]
    CreatedAt,
    /// Karma.
    #[serde(rename = "karma")]
    Karma,
}

impl SortKey for UserSort {
    const ENTITY: Entity = Entity::Users;

    fn field(&self) -> Field {
        match self {
            Self::CreatedAt => Field::CreatedAt,
            Self::Karma => Field::Karma,
        }
    }
}
