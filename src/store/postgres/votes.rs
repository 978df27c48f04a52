use async_trait::async_trait;
use sqlx::postgres::Postgres;
use sqlx::{Row, Transaction};

use super::PostgresForumStore;
use crate::error::{ForumError, ForumResult};
use crate::store::VoteStore;
use crate::types::{CommentId, PostId, UserId, VoteTally, VoteValue};

/// Statements for one votable table.
struct VoteTarget {
    lock_live: &'static str,
    upsert: &'static str,
    rescore: &'static str,
}

const POST_TARGET: VoteTarget = VoteTarget {
    lock_live: "SELECT user_id FROM posts WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    upsert: r#"
        INSERT INTO post_votes (user_id, post_id, vote_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, post_id) DO UPDATE SET vote_value = EXCLUDED.vote_value
    "#,
    rescore: r#"
        UPDATE posts
        SET score = (SELECT COALESCE(SUM(vote_value), 0) FROM post_votes WHERE post_id = $1)
        WHERE id = $1
        RETURNING score
    "#,
};

const COMMENT_TARGET: VoteTarget = VoteTarget {
    lock_live: "SELECT user_id FROM comments WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    upsert: r#"
        INSERT INTO comment_votes (user_id, comment_id, vote_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, comment_id) DO UPDATE SET vote_value = EXCLUDED.vote_value
    "#,
    rescore: r#"
        UPDATE comments
        SET score = (SELECT COALESCE(SUM(vote_value), 0) FROM comment_votes WHERE comment_id = $1)
        WHERE id = $1
        RETURNING score
    "#,
};

/// Serializes karma recomputation per author. Taken after the target lock,
/// so the lock order is always target then author.
const LOCK_AUTHOR: &str = "SELECT 1 FROM users WHERE id = $1 FOR UPDATE";

const RECOMPUTE_KARMA: &str = r#"
    UPDATE users
    SET karma = (SELECT COALESCE(SUM(score), 0) FROM posts WHERE user_id = $1)
              + (SELECT COALESCE(SUM(score), 0) FROM comments WHERE user_id = $1)
    WHERE id = $1
    RETURNING karma
"#;

impl PostgresForumStore {
    /// Upsert the vote, re-derive the target score and the author's karma.
    async fn record_vote(
        &self,
        target: &VoteTarget,
        voter: UserId,
        target_id: i64,
        value: VoteValue,
    ) -> ForumResult<VoteTally> {
        let mut tx: Transaction<'_, Postgres> = self.pool.begin().await?;

        let author: i64 = sqlx::query(target.lock_live)
            .bind(target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(ForumError::NoRowsAffected)?
            .try_get("user_id")?;

        // Without this a concurrent vote on another of the author's items can
        // commit between our rescore and karma snapshot, and its score would
        // be missing from the karma we write.
        sqlx::query(LOCK_AUTHOR)
            .bind(author)
            .execute(&mut *tx)
            .await?;

        sqlx::query(target.upsert)
            .bind(voter.get())
            .bind(target_id)
            .bind(value.weight())
            .execute(&mut *tx)
            .await?;

        let score: i64 = sqlx::query(target.rescore)
            .bind(target_id)
            .fetch_one(&mut *tx)
            .await?
            .try_get("score")?;

        let author_karma: i64 = sqlx::query(RECOMPUTE_KARMA)
            .bind(author)
            .fetch_one(&mut *tx)
            .await?
            .try_get("karma")?;

        tx.commit().await?;

        Ok(VoteTally {
            score,
            author_id: UserId::new(author),
            author_karma,
        })
    }
}

#[async_trait]
impl VoteStore for PostgresForumStore {
    async fn vote_post(
        &self,
        voter: UserId,
        post_id: PostId,
        value: VoteValue,
    ) -> ForumResult<VoteTally> {
        let tally = self.record_vote(&POST_TARGET, voter, post_id.get(), value).await?;
        tracing::debug!(post_id = %post_id, voter = %voter, score = tally.score, "Post vote recorded");
        Ok(tally)
    }

    async fn vote_comment(
        &self,
        voter: UserId,
        comment_id: CommentId,
        value: VoteValue,
    ) -> ForumResult<VoteTally> {
        let tally = self
            .record_vote(&COMMENT_TARGET, voter, comment_id.get(), value)
            .await?;
        tracing::debug!(comment_id = %comment_id, voter = %voter, score = tally.score, "Comment vote recorded");
        Ok(tally)
    }
}
