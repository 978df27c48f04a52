//! Vote transactions against a live PostgreSQL.
//!
//! Runs with `--features postgres` and a `DATABASE_URL`; without a URL the
//! tests return early.

#![cfg(feature = "postgres")]

use std::time::Duration;

use forum_kernel::store::{CommentStore, PostStore, TopicStore, UserStore, VoteStore};
use forum_kernel::{
    CommentId, ForumError, NewComment, NewPost, NewTopic, NewUser, PostgresForumStore, UserId,
    Viewer, VoteValue,
};
use sqlx::postgres::PgPoolOptions;

async fn store() -> Option<PostgresForumStore> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("connect database");
    let store = PostgresForumStore::from_pool(pool);
    store.apply_schema().await.expect("apply schema");
    Some(store)
}

async fn user(store: &PostgresForumStore, tag: &str) -> UserId {
    let name = format!("{}-{}", tag, uuid::Uuid::new_v4().simple());
    store
        .create_user(&NewUser {
            email: format!("{}@example.com", name),
            username: name,
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_overlapping_votes_on_one_authors_comments_keep_karma_exact() {
    let Some(store) = store().await else { return };

    let author = user(&store, "author").await;
    let first_voter = user(&store, "voter").await;
    let second_voter = user(&store, "voter").await;
    let topic = store
        .create_topic(&NewTopic {
            name: format!("Concurrency {}", uuid::Uuid::new_v4().simple()),
            description: String::new(),
        })
        .await
        .unwrap();
    let post = store
        .create_post(&NewPost {
            topic_id: topic,
            user_id: second_voter,
            title: "Row locks".to_string(),
            content: "body".to_string(),
        })
        .await
        .unwrap();
    let mut comments = Vec::new();
    for content in ["first", "second"] {
        comments.push(
            store
                .create_comment(&NewComment {
                    post_id: post,
                    parent_id: None,
                    user_id: author,
                    content: content.to_string(),
                })
                .await
                .unwrap(),
        );
    }

    // Hold the author's row so both votes are in flight at once.
    let mut holder = store.pool().begin().await.unwrap();
    sqlx::query("SELECT 1 FROM users WHERE id = $1 FOR UPDATE")
        .bind(author.get())
        .execute(&mut *holder)
        .await
        .unwrap();

    let first = tokio::spawn({
        let store = store.clone();
        let comment = comments[0];
        async move { store.vote_comment(first_voter, comment, VoteValue::Up).await }
    });
    let second = tokio::spawn({
        let store = store.clone();
        let comment = comments[1];
        async move { store.vote_comment(second_voter, comment, VoteValue::Up).await }
    });

    tokio::time::sleep(Duration::from_millis(500)).await;
    holder.commit().await.unwrap();

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let mut score_sum = 0;
    for id in &comments {
        let comment = store.get_comment(*id, &Viewer::Anonymous).await.unwrap();
        assert_eq!(comment.score, 1);
        score_sum += comment.score;
    }
    let karma = store.get_user(author).await.unwrap().karma;
    assert_eq!(karma, score_sum);
    assert_eq!(karma, 2);
}

#[tokio::test]
async fn test_vote_on_missing_comment_leaves_no_row() {
    let Some(store) = store().await else { return };
    let voter = user(&store, "voter").await;

    let err = store
        .vote_comment(voter, CommentId::new(i64::MAX), VoteValue::Up)
        .await
        .unwrap_err();
    assert_eq!(err, ForumError::NoRowsAffected);
}
