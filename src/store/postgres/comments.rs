use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::rows::parse_comment;
use super::PostgresForumStore;
use crate::error::{ForumError, ForumResult};
use crate::query::{render, render_detail, CommentSort, Entity, Field, ListQuery, Paged, SqlParam};
use crate::store::CommentStore;
use crate::types::{Comment, CommentId, CommentPath, NewComment, Summary, Viewer};

#[async_trait]
impl CommentStore for PostgresForumStore {
    async fn create_comment(&self, new: &NewComment) -> ForumResult<CommentId> {
        let mut tx = self.pool.begin().await?;

        let parent_path = match new.parent_id {
            None => {
                let live: Option<bool> =
                    sqlx::query("SELECT NOT is_deleted AS live FROM posts WHERE id = $1")
                        .bind(new.post_id.get())
                        .fetch_optional(&mut *tx)
                        .await?
                        .map(|row| row.try_get("live"))
                        .transpose()?;
                if live != Some(true) {
                    return Err(ForumError::NotFound);
                }
                None
            }
            Some(parent_id) => {
                let row = sqlx::query("SELECT post_id, path::text AS path FROM comments WHERE id = $1")
                    .bind(parent_id.get())
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(ForumError::NotFound)?;
                let parent_post: i64 = row.try_get("post_id")?;
                if parent_post != new.post_id.get() {
                    tracing::warn!(
                        post_id = %new.post_id,
                        parent_id = %parent_id,
                        "Reply rejected: parent belongs to another post"
                    );
                    return Err(ForumError::validation("parent comment belongs to another post"));
                }
                let path: Option<String> = row.try_get("path")?;
                let path: CommentPath = path
                    .ok_or_else(|| ForumError::Unexpected("parent comment has no path".into()))?
                    .parse()
                    .map_err(ForumError::unexpected)?;
                Some(path)
            }
        };

        let summary = Summary::for_comment(&new.content);
        let now = Utc::now();
        let id: i64 = sqlx::query(
            r#"
            INSERT INTO comments
                (post_id, parent_id, content, summary, has_long_content, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id
            "#,
        )
        .bind(new.post_id.get())
        .bind(new.parent_id.map(|p| p.get()))
        .bind(&new.content)
        .bind(&summary.text)
        .bind(summary.truncated)
        .bind(new.user_id.get())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;
        let id = CommentId::new(id);

        // the path needs the id, so it is written in a second statement
        let path = CommentPath::for_new_comment(parent_path.as_ref(), id);
        sqlx::query("UPDATE comments SET path = $1::ltree WHERE id = $2")
            .bind(path.to_string())
            .bind(id.get())
            .execute(&mut *tx)
            .await?;

        let bumped = sqlx::query("UPDATE posts SET no_of_comments = no_of_comments + 1 WHERE id = $1")
            .bind(new.post_id.get())
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(ForumError::NotFound);
        }

        if let Some(parent_id) = new.parent_id {
            sqlx::query("UPDATE comments SET no_of_replies = no_of_replies + 1 WHERE id = $1")
                .bind(parent_id.get())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(comment_id = %id, post_id = %new.post_id, path = %path, "Comment created");
        Ok(id)
    }

    async fn update_comment(&self, id: CommentId, content: &str) -> ForumResult<()> {
        let summary = Summary::for_comment(content);
        let result = sqlx::query(
            r#"
            UPDATE comments
            SET content = $1, summary = $2, has_long_content = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(content)
        .bind(&summary.text)
        .bind(summary.truncated)
        .bind(Utc::now())
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }
        Ok(())
    }

    async fn delete_comment(&self, id: CommentId) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;

        let post_id: i64 = sqlx::query(
            r#"
            UPDATE comments
            SET is_deleted = TRUE, deleted_at = $1
            WHERE id = $2 AND is_deleted = FALSE
            RETURNING post_id
            "#,
        )
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ForumError::NoRowsAffected)?
        .try_get("post_id")?;

        sqlx::query("UPDATE posts SET no_of_comments = no_of_comments - 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(comment_id = %id, post_id, "Comment soft-deleted");
        Ok(())
    }

    async fn get_comment(&self, id: CommentId, viewer: &Viewer) -> ForumResult<Comment> {
        let stmt = render_detail(Entity::Comments, Field::Id, SqlParam::Int(id.get()), viewer);
        self.fetch_detail(&stmt, parse_comment)
            .await?
            .ok_or(ForumError::NotFound)
    }

    async fn list_comments(
        &self,
        query: &ListQuery<CommentSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Comment>> {
        query.validate()?;
        self.fetch_page(&render(query, viewer), parse_comment).await
    }
}
