//! PostgreSQL rendering of listing queries.
//!
//! Rendering is pure string building so it can be tested and benchmarked
//! without a database. Every caller-supplied value travels as a positional
//! [`SqlParam`]; only column names and keywords from closed enums are ever
//! spliced into the text.

use std::fmt::Write as _;

use super::list::ListQuery;
use super::predicate::{Entity, Field, Predicate};
use super::sort::SortKey;
use crate::types::Viewer;

/// A positional bind value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    /// `BIGINT`
    Int(i64),
    /// `TEXT`
    Text(String),
}

/// SQL text plus its bind values, `$1` first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    /// Statement text with `$N` placeholders.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<SqlParam>,
}

/// Fetch and count statements for one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedListing {
    /// Page of rows.
    pub fetch: SqlStatement,
    /// `COUNT(*)` over the same predicates, ignoring pagination.
    pub count: SqlStatement,
}

/// Which columns a row read needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// List views: heavy text columns come back empty.
    Listing,
    /// Single-row reads: every column.
    Detail,
}

struct Builder {
    sql: String,
    params: Vec<SqlParam>,
}

impl Builder {
    fn new() -> Self {
        Self {
            sql: String::with_capacity(512),
            params: Vec::new(),
        }
    }

    fn bind(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("${}", self.params.len())
    }

    fn push(&mut self, text: &str) {
        self.sql.push_str(text);
    }

    fn finish(self) -> SqlStatement {
        SqlStatement {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Escape LIKE wildcards so the needle matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Render a listing into its fetch and count statements.
pub fn render<S: SortKey>(query: &ListQuery<S>, viewer: &Viewer) -> RenderedListing {
    let entity = S::ENTITY;
    let alias = entity.alias();

    let mut fetch = Builder::new();
    push_select(&mut fetch, entity, Projection::Listing, viewer);
    push_where(&mut fetch, entity, query.predicates());
    let direction = query.direction().sql();
    let _ = write!(
        fetch.sql,
        " ORDER BY {alias}.{} {direction}, {alias}.id {direction}",
        query.sort().field().column()
    );
    let limit = fetch.bind(SqlParam::Int(query.page().limit()));
    let offset = fetch.bind(SqlParam::Int(query.page().offset()));
    let _ = write!(fetch.sql, " LIMIT {limit} OFFSET {offset}");

    let mut count = Builder::new();
    let _ = write!(count.sql, "SELECT COUNT(*) FROM {} {alias}", entity.table());
    push_where(&mut count, entity, query.predicates());

    RenderedListing {
        fetch: fetch.finish(),
        count: count.finish(),
    }
}

/// Render a single-row read keyed on `key = value`.
pub fn render_detail(entity: Entity, key: Field, value: SqlParam, viewer: &Viewer) -> SqlStatement {
    let mut stmt = Builder::new();
    push_select(&mut stmt, entity, Projection::Detail, viewer);
    let placeholder = stmt.bind(value);
    let _ = write!(stmt.sql, " WHERE {}.{} = {placeholder}", entity.alias(), key.column());
    stmt.finish()
}

fn push_select(b: &mut Builder, entity: Entity, projection: Projection, viewer: &Viewer) {
    let detail = projection == Projection::Detail;
    match entity {
        Entity::Posts => {
            let my_vote = match viewer.user_id() {
                Some(user) => {
                    let p = b.bind(SqlParam::Int(user.get()));
                    (
                        "COALESCE(v.vote_value, 0)::smallint",
                        format!(" LEFT JOIN post_votes v ON v.post_id = p.id AND v.user_id = {p}"),
                    )
                }
                None => ("0::smallint", String::new()),
            };
            let _ = write!(
                b.sql,
                "SELECT p.id, p.topic_id, p.title, p.summary, {content}, p.user_id, \
                 p.created_at, p.updated_at, {pinned}, p.score, p.no_of_comments, \
                 p.is_deleted, p.deleted_at, t.name AS topic_name, u.username AS username, \
                 {vote} AS my_vote \
                 FROM posts p \
                 JOIN topics t ON t.id = p.topic_id \
                 JOIN users u ON u.id = p.user_id{join}",
                content = if detail { "p.content" } else { "'' AS content" },
                pinned = if detail {
                    "p.pinned_comment_id"
                } else {
                    "NULL::bigint AS pinned_comment_id"
                },
                vote = my_vote.0,
                join = my_vote.1,
            );
        }
        Entity::Comments => {
            let my_vote = match viewer.user_id() {
                Some(user) => {
                    let p = b.bind(SqlParam::Int(user.get()));
                    (
                        "COALESCE(v.vote_value, 0)::smallint",
                        format!(
                            " LEFT JOIN comment_votes v ON v.comment_id = c.id AND v.user_id = {p}"
                        ),
                    )
                }
                None => ("0::smallint", String::new()),
            };
            let _ = write!(
                b.sql,
                "SELECT c.id, c.post_id, c.parent_id, c.path::text AS path, {content}, \
                 c.summary, c.has_long_content, c.user_id, c.created_at, c.updated_at, \
                 c.score, c.no_of_replies, c.is_deleted, c.deleted_at, \
                 CASE WHEN p.is_deleted THEN '' ELSE p.title END AS post_title, \
                 u.username AS username, t.name AS topic_name, {vote} AS my_vote \
                 FROM comments c \
                 JOIN posts p ON p.id = c.post_id \
                 JOIN topics t ON t.id = p.topic_id \
                 JOIN users u ON u.id = c.user_id{join}",
                content = if detail { "c.content" } else { "'' AS content" },
                vote = my_vote.0,
                join = my_vote.1,
            );
        }
        Entity::Topics => {
            let following = match viewer.user_id() {
                Some(user) => {
                    let p = b.bind(SqlParam::Int(user.get()));
                    format!(
                        "EXISTS (SELECT 1 FROM user_topics f \
                         WHERE f.topic_id = t.id AND f.user_id = {p})"
                    )
                }
                None => "FALSE".to_string(),
            };
            let _ = write!(
                b.sql,
                "SELECT t.id, t.name, t.description, t.no_of_posts, t.no_of_followers, \
                 {following} AS is_following FROM topics t"
            );
        }
        Entity::Users => {
            let _ = write!(
                b.sql,
                "SELECT u.id, u.username, {email}, u.karma, u.created_at FROM users u",
                email = if detail { "u.email" } else { "'' AS email" },
            );
        }
    }
}

fn push_where(b: &mut Builder, entity: Entity, predicates: &[Predicate]) {
    let alias = entity.alias();
    for (i, predicate) in predicates.iter().enumerate() {
        b.push(if i == 0 { " WHERE " } else { " AND " });
        match predicate {
            Predicate::Contains { field, needle } => {
                let p = b.bind(SqlParam::Text(format!("%{}%", escape_like(needle))));
                let _ = write!(b.sql, "{alias}.{} ILIKE {p}", field.column());
            }
            Predicate::Equals { field, value } => {
                let p = b.bind(SqlParam::Int(*value));
                let _ = write!(b.sql, "{alias}.{} = {p}", field.column());
            }
            Predicate::IsNull { field } => {
                let _ = write!(b.sql, "{alias}.{} IS NULL", field.column());
            }
            Predicate::NotDeleted => {
                let _ = write!(b.sql, "{alias}.is_deleted = FALSE");
            }
            Predicate::FollowedBy { user_id } => {
                let p = b.bind(SqlParam::Int(user_id.get()));
                let topic_column = match entity {
                    Entity::Topics => "id",
                    _ => "topic_id",
                };
                let _ = write!(
                    b.sql,
                    "EXISTS (SELECT 1 FROM user_topics ut \
                     WHERE ut.topic_id = {alias}.{topic_column} AND ut.user_id = {p})"
                );
            }
            Predicate::DescendantOf { comment_id } => {
                let p = b.bind(SqlParam::Int(comment_id.get()));
                let _ = write!(
                    b.sql,
                    "{alias}.path <@ (SELECT path FROM comments WHERE id = {p}) AND {alias}.id <> {p}"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::page::Page;
    use crate::query::sort::{CommentSort, PostSort, SortDirection, TopicSort, UserSort};
    use crate::types::{CommentId, UserId};

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_anonymous_posts_listing() {
        let query = ListQuery::<PostSort>::new()
            .search("rust")
            .not_deleted()
            .sorted_by(PostSort::Score, SortDirection::Descending)
            .paged(Page::new(3, 10));
        let rendered = render(&query, &Viewer::Anonymous);

        assert!(rendered.fetch.sql.contains("0::smallint AS my_vote"));
        assert!(!rendered.fetch.sql.contains("post_votes"));
        assert!(rendered
            .fetch
            .sql
            .contains(" WHERE p.title ILIKE $1 AND p.is_deleted = FALSE"));
        assert!(rendered
            .fetch
            .sql
            .ends_with("ORDER BY p.score DESC, p.id DESC LIMIT $2 OFFSET $3"));
        assert_eq!(
            rendered.fetch.params,
            vec![
                SqlParam::Text("%rust%".into()),
                SqlParam::Int(10),
                SqlParam::Int(20)
            ]
        );

        assert_eq!(
            rendered.count.sql,
            "SELECT COUNT(*) FROM posts p WHERE p.title ILIKE $1 AND p.is_deleted = FALSE"
        );
        assert_eq!(rendered.count.params, vec![SqlParam::Text("%rust%".into())]);
    }

    #[test]
    fn test_viewer_join_takes_first_placeholder() {
        let viewer = Viewer::User(UserId::new(7));
        let query = ListQuery::<PostSort>::new()
            .filter(Predicate::FollowedBy { user_id: UserId::new(7) });
        let rendered = render(&query, &viewer);

        assert!(rendered
            .fetch
            .sql
            .contains("LEFT JOIN post_votes v ON v.post_id = p.id AND v.user_id = $1"));
        assert!(rendered
            .fetch
            .sql
            .contains("ut.topic_id = p.topic_id AND ut.user_id = $2"));
        // count has no viewer join, so the follow filter is $1 there
        assert!(rendered.count.sql.contains("ut.user_id = $1"));
        assert_eq!(rendered.count.params, vec![SqlParam::Int(7)]);
    }

    #[test]
    fn test_comment_subtree_predicate() {
        let query = ListQuery::<CommentSort>::new()
            .filter(Predicate::DescendantOf { comment_id: CommentId::new(12) })
            .sorted_by(CommentSort::CreatedAt, SortDirection::Ascending);
        let rendered = render(&query, &Viewer::Anonymous);
        assert_eq!(
            rendered.count.sql,
            "SELECT COUNT(*) FROM comments c \
             WHERE c.path <@ (SELECT path FROM comments WHERE id = $1) AND c.id <> $1"
        );
        assert!(rendered
            .fetch
            .sql
            .contains("ORDER BY c.created_at ASC, c.id ASC"));
    }

    #[test]
    fn test_topics_following_flag() {
        let anonymous = render(&ListQuery::<TopicSort>::new(), &Viewer::Anonymous);
        assert!(anonymous.fetch.sql.contains("FALSE AS is_following"));
        assert_eq!(anonymous.count.sql, "SELECT COUNT(*) FROM topics t");

        let signed_in = render(&ListQuery::<TopicSort>::new(), &Viewer::User(UserId::new(3)));
        assert!(signed_in
            .fetch
            .sql
            .contains("WHERE f.topic_id = t.id AND f.user_id = $1) AS is_following"));
        assert!(signed_in.fetch.sql.contains("ORDER BY t.name DESC, t.id DESC"));
    }

    #[test]
    fn test_users_listing_hides_email() {
        let rendered = render(
            &ListQuery::<UserSort>::new().sorted_by(UserSort::Karma, SortDirection::Descending),
            &Viewer::Anonymous,
        );
        assert!(rendered.fetch.sql.contains("'' AS email"));
        assert!(rendered.fetch.sql.contains("ORDER BY u.karma DESC"));
    }

    #[test]
    fn test_detail_reads_full_row() {
        let stmt = render_detail(
            Entity::Posts,
            Field::Id,
            SqlParam::Int(5),
            &Viewer::User(UserId::new(2)),
        );
        assert!(stmt.sql.contains("p.content"));
        assert!(stmt.sql.contains("p.pinned_comment_id"));
        assert!(stmt.sql.ends_with("WHERE p.id = $2"));
        assert_eq!(stmt.params, vec![SqlParam::Int(2), SqlParam::Int(5)]);
    }
}
