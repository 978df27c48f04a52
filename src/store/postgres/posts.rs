use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::rows::parse_post;
use super::PostgresForumStore;
use crate::error::{ForumError, ForumResult};
use crate::query::{render, render_detail, Entity, Field, ListQuery, Paged, PostSort, SqlParam};
use crate::store::PostStore;
use crate::types::{CommentId, NewPost, Post, PostId, PostUpdate, Summary, Viewer};

#[async_trait]
impl PostStore for PostgresForumStore {
    async fn create_post(&self, new: &NewPost) -> ForumResult<PostId> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE topics SET no_of_posts = no_of_posts + 1 WHERE id = $1")
            .bind(new.topic_id.get())
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(ForumError::NotFound);
        }

        let now = Utc::now();
        let id: i64 = sqlx::query(
            r#"
            INSERT INTO posts (topic_id, user_id, title, content, summary, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING id
            "#,
        )
        .bind(new.topic_id.get())
        .bind(new.user_id.get())
        .bind(&new.title)
        .bind(&new.content)
        .bind(Summary::for_post(&new.content).text)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?
        .try_get("id")?;

        tx.commit().await?;
        tracing::debug!(post_id = id, topic_id = %new.topic_id, "Post created");
        Ok(PostId::new(id))
    }

    async fn update_post(&self, id: PostId, update: &PostUpdate) -> ForumResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = $1, content = $2, summary = $3, updated_at = $4
            WHERE id = $5 AND is_deleted = FALSE
            "#,
        )
        .bind(&update.title)
        .bind(&update.content)
        .bind(Summary::for_post(&update.content).text)
        .bind(Utc::now())
        .bind(id.get())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }
        Ok(())
    }

    async fn delete_post(&self, id: PostId) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;

        let topic_id: i64 = sqlx::query(
            r#"
            UPDATE posts
            SET is_deleted = TRUE, deleted_at = $1
            WHERE id = $2 AND is_deleted = FALSE
            RETURNING topic_id
            "#,
        )
        .bind(Utc::now())
        .bind(id.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ForumError::NoRowsAffected)?
        .try_get("topic_id")?;

        sqlx::query("UPDATE topics SET no_of_posts = no_of_posts - 1 WHERE id = $1")
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(post_id = %id, topic_id, "Post soft-deleted");
        Ok(())
    }

    async fn get_post(&self, id: PostId, viewer: &Viewer) -> ForumResult<Post> {
        let stmt = render_detail(Entity::Posts, Field::Id, SqlParam::Int(id.get()), viewer);
        self.fetch_detail(&stmt, parse_post)
            .await?
            .ok_or(ForumError::NotFound)
    }

    async fn list_posts(
        &self,
        query: &ListQuery<PostSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Post>> {
        query.validate()?;
        self.fetch_page(&render(query, viewer), parse_post).await
    }

    async fn pin_comment(&self, post_id: PostId, comment_id: CommentId) -> ForumResult<()> {
        set_pinned(self, post_id, Some(comment_id)).await
    }

    async fn unpin_comment(&self, post_id: PostId) -> ForumResult<()> {
        set_pinned(self, post_id, None).await
    }
}

async fn set_pinned(
    store: &PostgresForumStore,
    post_id: PostId,
    comment_id: Option<CommentId>,
) -> ForumResult<()> {
    let result = sqlx::query(
        "UPDATE posts SET pinned_comment_id = $1 WHERE id = $2 AND is_deleted = FALSE",
    )
    .bind(comment_id.map(|c| c.get()))
    .bind(post_id.get())
    .execute(&store.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ForumError::NoRowsAffected);
    }
    tracing::debug!(post_id = %post_id, pinned = ?comment_id, "Pinned comment updated");
    Ok(())
}
