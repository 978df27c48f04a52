//! # forum-kernel
//!
//! Storage core for a threaded discussion forum.
//!
//! The kernel owns four things:
//!
//! 1. **Hierarchical comments**: every comment carries a materialized path
//!    (`{root}.{child}.{grandchild}`), so whole subtrees are read with one
//!    prefix predicate instead of recursive queries.
//! 2. **Voting and scoring**: a vote upserts the voter's row, then the
//!    target's score and the author's karma are recomputed from source inside
//!    the same transaction. Replays and reorderings converge to one state.
//! 3. **Topic follow graph**: follow edges with denormalized follower counts.
//! 4. **Query composition**: listings are an immutable [`ListQuery`] of
//!    predicates, a sort key and a page, rendered to parameterized SQL or
//!    evaluated in memory.
//!
//! ## Architecture
//!
//! ```text
//! ListPostsRequest ─▶ ListQuery ─▶ sql::render ─▶ PostgresForumStore
//!                         │
//!                         └──────▶ ListQuery::select ─▶ InMemoryForumStore
//! ```
//!
//! Both stores implement [`ForumStore`]; the optional HTTP service is generic
//! over it.
//!
//! ## Features
//!
//! - `postgres`: the sqlx-backed [`PostgresForumStore`]
//! - `service`: the axum router and the `forum_kernel_service` binary

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod query;
pub mod store;
pub mod types;

#[cfg(feature = "service")]
pub mod service;

// Re-exports
pub use error::{ForumError, ForumResult};
pub use query::{
    CommentSort, ListCommentsRequest, ListPostsRequest, ListQuery, ListTopicsRequest,
    ListUsersRequest, Page, Paged, PostSort, Predicate, SortDirection, TopicSort, UserSort,
};
pub use store::{
    CommentStore, ForumStore, InMemoryForumStore, PoolStats, PostStore, TopicStore, UserStore,
    VoteStore,
};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresForumStore};
pub use types::{
    Comment, CommentId, CommentPath, NewComment, NewPost, NewTopic, NewUser, Post, PostId,
    PostUpdate, ProfileUpdate, Topic, TopicId, TopicSummary, User, UserCredentials, UserId,
    Viewer, ViewerToken, VoteTally, VoteValue,
};

// Service re-exports (when service feature is enabled)
#[cfg(feature = "service")]
pub use service::{create_router, ServiceState};
