//! Query composition for listings.
//!
//! A listing is described once, as a [`ListQuery`], and then either rendered
//! to SQL ([`sql::render`]) or evaluated in memory ([`ListQuery::select`]).
//! Both paths read the same predicate list, so page contents and totals
//! agree across backends.

pub mod list;
pub mod page;
pub mod predicate;
pub mod request;
pub mod sort;
pub mod sql;

pub use list::ListQuery;
pub use page::{Page, Paged, MAX_PAGE_SIZE};
pub use predicate::{Entity, Field, Predicate, PredicateContext, RowView, SortValue};
pub use request::{ListCommentsRequest, ListPostsRequest, ListTopicsRequest, ListUsersRequest};
pub use sort::{CommentSort, PostSort, SortDirection, SortKey, TopicSort, UserSort};
pub use sql::{escape_like, render, render_detail, Projection, RenderedListing, SqlParam, SqlStatement};
