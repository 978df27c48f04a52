use async_trait::async_trait;
use sqlx::Row;

use super::rows::parse_user;
use super::PostgresForumStore;
use crate::error::{ForumError, ForumResult};
use crate::query::{render, render_detail, Entity, Field, ListQuery, Paged, SqlParam, UserSort};
use crate::store::UserStore;
use crate::types::{NewUser, ProfileUpdate, User, UserCredentials, UserId, Viewer};

#[async_trait]
impl UserStore for PostgresForumStore {
    async fn create_user(&self, new: &NewUser) -> ForumResult<UserId> {
        let id: i64 = sqlx::query(
            "INSERT INTO users (email, username, password) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await?
        .try_get("id")?;
        tracing::debug!(user_id = id, "User created");
        Ok(UserId::new(id))
    }

    async fn get_user(&self, id: UserId) -> ForumResult<User> {
        let stmt = render_detail(Entity::Users, Field::Id, SqlParam::Int(id.get()), &Viewer::Anonymous);
        self.fetch_detail(&stmt, parse_user)
            .await?
            .ok_or(ForumError::NotFound)
    }

    async fn get_user_by_username(&self, username: &str) -> ForumResult<User> {
        let stmt = render_detail(
            Entity::Users,
            Field::Username,
            SqlParam::Text(username.to_string()),
            &Viewer::Anonymous,
        );
        self.fetch_detail(&stmt, parse_user)
            .await?
            .ok_or(ForumError::NotFound)
    }

    async fn find_credentials(&self, email: &str) -> ForumResult<UserCredentials> {
        let row = sqlx::query("SELECT id, username, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ForumError::NotFound)?;
        Ok(UserCredentials {
            id: UserId::new(row.try_get("id")?),
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
        })
    }

    async fn update_profile(&self, id: UserId, update: &ProfileUpdate) -> ForumResult<()> {
        let result = sqlx::query("UPDATE users SET email = $1, username = $2 WHERE id = $3")
            .bind(&update.email)
            .bind(&update.username)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }
        Ok(())
    }

    async fn update_password(&self, id: UserId, password_hash: &str) -> ForumResult<()> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id.get())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(ForumError::NoRowsAffected);
        }
        Ok(())
    }

    async fn list_users(
        &self,
        query: &ListQuery<UserSort>,
        viewer: &Viewer,
    ) -> ForumResult<Paged<User>> {
        query.validate()?;
        self.fetch_page(&render(query, viewer), parse_user).await
    }
}
