use async_trait::async_trait;
use sqlx::Row;

use super::rows::parse_topic;
use super::PostgresForumStore;
use crate::error::{ForumError, ForumResult};
use crate::query::{render, render_detail, Entity, Field, ListQuery, Paged, SqlParam, TopicSort};
use crate::store::TopicStore;
use crate::types::{NewTopic, Topic, TopicId, TopicSummary, UserId, Viewer};

#[async_trait]
impl TopicStore for PostgresForumStore {
    async fn create_topic(&self, new: &NewTopic) -> ForumResult<TopicId> {
        let id: i64 = sqlx::query("INSERT INTO topics (name, description) VALUES ($1, $2) RETURNING id")
            .bind(&new.name)
            .bind(&new.description)
            .fetch_one(&self.pool)
            .await?
            .try_get("id")?;
        Ok(TopicId::new(id))
    }

    async fn get_topic(&self, name: &str, viewer: &Viewer) -> ForumResult<Topic> {
        let stmt = render_detail(
            Entity::Topics,
            Field::Name,
            SqlParam::Text(name.to_string()),
            viewer,
        );
        self.fetch_detail(&stmt, parse_topic)
            .await?
            .ok_or(ForumError::NotFound)
    }

    async fn list_topics(
        &self,
        query: &ListQuery<TopicSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<Topic>> {
        query.validate()?;
        self.fetch_page(&render(query, viewer), parse_topic).await
    }

    async fn list_topic_summaries(&self) -> ForumResult<Vec<TopicSummary>> {
        let rows = sqlx::query("SELECT id, name FROM topics ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| -> ForumResult<TopicSummary> {
                Ok(TopicSummary {
                    id: TopicId::new(row.try_get("id")?),
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn follow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;

        let topic_id: i64 = sqlx::query("SELECT id FROM topics WHERE name = $1")
            .bind(topic_name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ForumError::NotFound)?
            .try_get("id")?;

        let inserted = sqlx::query(
            "INSERT INTO user_topics (user_id, topic_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(user_id.get())
        .bind(topic_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }

        sqlx::query("UPDATE topics SET no_of_followers = no_of_followers + 1 WHERE id = $1")
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = %user_id, topic_id, "Topic followed");
        Ok(())
    }

    async fn unfollow_topic(&self, user_id: UserId, topic_name: &str) -> ForumResult<()> {
        let mut tx = self.pool.begin().await?;

        let topic_id: i64 = sqlx::query("SELECT id FROM topics WHERE name = $1")
            .bind(topic_name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ForumError::NotFound)?
            .try_get("id")?;

        let removed = sqlx::query("DELETE FROM user_topics WHERE user_id = $1 AND topic_id = $2")
            .bind(user_id.get())
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }

        sqlx::query("UPDATE topics SET no_of_followers = no_of_followers - 1 WHERE id = $1")
            .bind(topic_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(user_id = %user_id, topic_id, "Topic unfollowed");
        Ok(())
    }
}
