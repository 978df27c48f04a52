//! Listing requests as they arrive from callers.
//!
//! Each request turns into a [`ListQuery`] for a given [`Viewer`]; combinations
//! that cannot be honored are rejected before any store is touched.

use serde::{Deserialize, Serialize};

use super::list::ListQuery;
use super::page::{Page, Paged};
use super::predicate::{Field, Predicate};
use super::sort::{CommentSort, PostSort, SortDirection, TopicSort, UserSort};
use crate::error::{ForumError, ForumResult};
use crate::types::{Comment, CommentId, PostId, TopicId, UserId, Viewer};

fn following_filter(viewer: &Viewer, requested: bool) -> ForumResult<Option<Predicate>> {
    if !requested {
        return Ok(None);
    }
    match viewer.user_id() {
        Some(user_id) => Ok(Some(Predicate::FollowedBy { user_id })),
        None => Err(ForumError::validation(
            "following-only listings require a signed-in viewer",
        )),
    }
}

/// Filters for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListPostsRequest {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub page_size: i64,
    /// Sort key.
    pub sort: PostSort,
    /// Sort direction.
    pub order_by: SortDirection,
    /// Title substring.
    pub search: String,
    /// Restrict to one topic.
    pub topic_id: Option<TopicId>,
    /// Restrict to one author.
    pub user_id: Option<UserId>,
    /// Only posts in topics the viewer follows.
    pub filter_following_topics: bool,
    /// Include tombstoned posts.
    pub show_deleted_posts: bool,
}

impl ListPostsRequest {
    /// Compose the listing query.
    pub fn into_query(&self, viewer: &Viewer) -> ForumResult<ListQuery<PostSort>> {
        let mut query = ListQuery::new()
            .search(&self.search)
            .filter_opt(following_filter(viewer, self.filter_following_topics)?);
        if let Some(topic_id) = self.topic_id {
            query = query.equals(Field::TopicId, topic_id.get());
        }
        if let Some(user_id) = self.user_id {
            query = query.equals(Field::UserId, user_id.get());
        }
        if !self.show_deleted_posts {
            query = query.not_deleted();
        }
        Ok(query
            .sorted_by(self.sort, self.order_by)
            .paged(Page::new(self.page, self.page_size)))
    }
}

/// Filters for listing comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListCommentsRequest {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub page_size: i64,
    /// Sort key.
    pub sort: CommentSort,
    /// Sort direction.
    pub order_by: SortDirection,
    /// Content substring.
    pub search: String,
    /// Restrict to one post.
    pub post_id: Option<PostId>,
    /// Restrict to one author.
    pub user_id: Option<UserId>,
    /// Subtree root (see [`ListCommentsRequest::into_query`]).
    pub parent_id: Option<CommentId>,
    /// Only one level of the tree.
    pub only_top_level: bool,
    /// Include tombstoned comments.
    pub show_deleted_comments: bool,
    /// Keep the owning post's title on each row.
    pub show_post_title: bool,
}

impl ListCommentsRequest {
    /// Compose the listing query.
    ///
    /// `parent_id` and `only_top_level` combine as follows:
    ///
    /// | `parent_id` | `only_top_level` | rows                                   |
    /// |-------------|------------------|----------------------------------------|
    /// | set         | true             | direct children of the parent          |
    /// | set         | false            | whole subtree below the parent         |
    /// | unset       | true             | top-level comments                     |
    /// | unset       | false            | no hierarchy filter                    |
    pub fn into_query(&self, _viewer: &Viewer) -> ForumResult<ListQuery<CommentSort>> {
        let mut query = ListQuery::new().search(&self.search);
        if let Some(post_id) = self.post_id {
            query = query.equals(Field::PostId, post_id.get());
        }
        if let Some(user_id) = self.user_id {
            query = query.equals(Field::UserId, user_id.get());
        }
        query = match (self.parent_id, self.only_top_level) {
            (Some(parent), true) => query.equals(Field::ParentId, parent.get()),
            (Some(parent), false) => query.filter(Predicate::DescendantOf { comment_id: parent }),
            (None, true) => query.filter(Predicate::IsNull { field: Field::ParentId }),
            (None, false) => query,
        };
        if !self.show_deleted_comments {
            query = query.not_deleted();
        }
        Ok(query
            .sorted_by(self.sort, self.order_by)
            .paged(Page::new(self.page, self.page_size)))
    }

    /// Drop fields the caller did not ask for.
    pub fn project(&self, page: Paged<Comment>) -> Paged<Comment> {
        if self.show_post_title {
            return page;
        }
        page.map(|mut comment| {
            comment.post_title = None;
            comment
        })
    }
}

/// Filters for listing topics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListTopicsRequest {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub page_size: i64,
    /// Sort key.
    pub sort: TopicSort,
    /// Sort direction.
    pub order_by: SortDirection,
    /// Name substring.
    pub search: String,
    /// Only topics the viewer follows.
    pub filter_following: bool,
}

impl ListTopicsRequest {
    /// Compose the listing query.
    pub fn into_query(&self, viewer: &Viewer) -> ForumResult<ListQuery<TopicSort>> {
        Ok(ListQuery::new()
            .search(&self.search)
            .filter_opt(following_filter(viewer, self.filter_following)?)
            .sorted_by(self.sort, self.order_by)
            .paged(Page::new(self.page, self.page_size)))
    }
}

/// Filters for listing users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListUsersRequest {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub page_size: i64,
    /// Sort key.
    pub sort: UserSort,
    /// Sort direction.
    pub order_by: SortDirection,
    /// Username substring.
    pub search: String,
}

impl ListUsersRequest {
    /// Compose the listing query.
    pub fn into_query(&self, _viewer: &Viewer) -> ForumResult<ListQuery<UserSort>> {
        Ok(ListQuery::new()
            .search(&self.search)
            .sorted_by(self.sort, self.order_by)
            .paged(Page::new(self.page, self.page_size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_posts_hide_deleted_by_default() {
        let query = ListPostsRequest::default().into_query(&Viewer::Anonymous).unwrap();
        assert_eq!(query.predicates(), &[Predicate::NotDeleted]);
        assert_eq!(query.sort(), PostSort::CreatedAt);
        assert_eq!(query.direction(), SortDirection::Descending);
    }

    #[test]
    fn test_following_requires_viewer() {
        let req = ListPostsRequest {
            filter_following_topics: true,
            ..Default::default()
        };
        assert!(matches!(
            req.into_query(&Viewer::Anonymous),
            Err(ForumError::Validation(_))
        ));
        let query = req.into_query(&Viewer::User(UserId::new(9))).unwrap();
        assert!(query
            .predicates()
            .contains(&Predicate::FollowedBy { user_id: UserId::new(9) }));

        let topics = ListTopicsRequest {
            filter_following: true,
            ..Default::default()
        };
        assert!(topics.into_query(&Viewer::Anonymous).is_err());
    }

    #[test]
    fn test_comment_hierarchy_filters() {
        let parent = CommentId::new(12);
        let direct = ListCommentsRequest {
            parent_id: Some(parent),
            only_top_level: true,
            show_deleted_comments: true,
            ..Default::default()
        };
        assert_eq!(
            direct.into_query(&Viewer::Anonymous).unwrap().predicates(),
            &[Predicate::Equals { field: Field::ParentId, value: 12 }]
        );

        let subtree = ListCommentsRequest {
            parent_id: Some(parent),
            show_deleted_comments: true,
            ..Default::default()
        };
        assert_eq!(
            subtree.into_query(&Viewer::Anonymous).unwrap().predicates(),
            &[Predicate::DescendantOf { comment_id: parent }]
        );

        let top = ListCommentsRequest {
            only_top_level: true,
            ..Default::default()
        };
        assert_eq!(
            top.into_query(&Viewer::Anonymous).unwrap().predicates(),
            &[Predicate::IsNull { field: Field::ParentId }, Predicate::NotDeleted]
        );
    }

    #[test]
    fn test_query_string_shape() {
        let req: ListTopicsRequest =
            serde_json::from_str(r#"{"sort":"no_of_followers","order_by":"asc","page_size":5}"#)
                .unwrap();
        assert_eq!(req.sort, TopicSort::Followers);
        assert_eq!(req.order_by, SortDirection::Ascending);
        let query = req.into_query(&Viewer::Anonymous).unwrap();
        assert_eq!(query.page().limit(), 5);
    }
}
