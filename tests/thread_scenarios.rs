//! Thread-level scenarios for the forum kernel.
//!
//! These tests drive the in-memory store through whole conversations and
//! check that paths, counters, scores and karma stay consistent.

use forum_kernel::store::{CommentStore, PostStore, TopicStore, UserStore, VoteStore};
use forum_kernel::{
    CommentId, CommentPath, ForumError, InMemoryForumStore, ListCommentsRequest, NewComment,
    NewPost, NewTopic, NewUser, PostId, TopicId, UserId, Viewer, VoteValue,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

struct Forum {
    store: InMemoryForumStore,
    alice: UserId,
    bob: UserId,
    topic: TopicId,
    post: PostId,
}

async fn user(store: &InMemoryForumStore, name: &str) -> UserId {
    store
        .create_user(&NewUser {
            email: format!("{}@example.com", name),
            username: name.to_string(),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap()
}

async fn forum() -> Forum {
    let store = InMemoryForumStore::new();
    let alice = user(&store, "alice").await;
    let bob = user(&store, "bob").await;
    let topic = store
        .create_topic(&NewTopic {
            name: "Web Development".to_string(),
            description: "Browsers, servers and everything between".to_string(),
        })
        .await
        .unwrap();
    let post = store
        .create_post(&NewPost {
            topic_id: topic,
            user_id: alice,
            title: "Server-side rendering".to_string(),
            content: "Is it worth it?".to_string(),
        })
        .await
        .unwrap();
    Forum { store, alice, bob, topic, post }
}

impl Forum {
    async fn comment(&self, parent: Option<CommentId>, author: UserId, content: &str) -> CommentId {
        self.store
            .create_comment(&NewComment {
                post_id: self.post,
                parent_id: parent,
                user_id: author,
                content: content.to_string(),
            })
            .await
            .unwrap()
    }

    async fn comments_on_post(&self) -> i64 {
        self.store
            .get_post(self.post, &Viewer::Anonymous)
            .await
            .unwrap()
            .no_of_comments
    }

    async fn karma(&self, user: UserId) -> i64 {
        self.store.get_user(user).await.unwrap().karma
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Threads
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_reply_thread_scenario() {
    let f = forum().await;

    let c1 = f.comment(None, f.bob, "Depends on the app").await;
    let first = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert_eq!(first.path, CommentPath::root(c1));
    assert_eq!(first.path.to_string(), c1.to_string());
    assert_eq!(f.comments_on_post().await, 1);

    let c2 = f.comment(Some(c1), f.alice, "Which apps?").await;
    let second = f.store.get_comment(c2, &Viewer::Anonymous).await.unwrap();
    assert_eq!(second.path.to_string(), format!("{}.{}", c1, c2));
    assert!(second.path.is_descendant_of(&first.path));

    let first = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert_eq!(first.no_of_replies, 1);
    assert_eq!(f.comments_on_post().await, 2);

    let karma_before = f.karma(f.bob).await;
    let tally = f.store.vote_comment(f.bob, c1, VoteValue::Down).await.unwrap();
    assert_eq!(tally.score, -1);
    assert_eq!(tally.author_id, f.bob);
    assert_eq!(f.karma(f.bob).await, karma_before - 1);

    let request = ListCommentsRequest {
        post_id: Some(f.post),
        only_top_level: true,
        ..Default::default()
    };
    let viewer = Viewer::User(f.bob);
    let query = request.into_query(&viewer).unwrap();
    let page = f.store.list_comments(&query, &viewer).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, c1);
    assert_eq!(page.items[0].my_vote, VoteValue::Down);
}

#[tokio::test]
async fn test_deep_thread_paths() {
    let f = forum().await;
    let mut parent = None;
    let mut ids = Vec::new();
    for depth in 0..6 {
        let id = f.comment(parent, f.alice, &format!("level {}", depth)).await;
        ids.push(id);
        parent = Some(id);
    }

    let leaf = f
        .store
        .get_comment(*ids.last().unwrap(), &Viewer::Anonymous)
        .await
        .unwrap();
    assert_eq!(leaf.path.segments(), ids.as_slice());
    assert_eq!(leaf.path.root_id(), ids[0]);
    assert_eq!(f.comments_on_post().await, 6);
}

#[tokio::test]
async fn test_reply_to_foreign_post_is_rejected() {
    let f = forum().await;
    let c1 = f.comment(None, f.bob, "root").await;
    let other = f
        .store
        .create_post(&NewPost {
            topic_id: f.topic,
            user_id: f.bob,
            title: "Another".to_string(),
            content: "thread".to_string(),
        })
        .await
        .unwrap();

    let err = f
        .store
        .create_comment(&NewComment {
            post_id: other,
            parent_id: Some(c1),
            user_id: f.alice,
            content: "misplaced".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::Validation(_)));

    let err = f
        .store
        .create_comment(&NewComment {
            post_id: f.post,
            parent_id: Some(CommentId::new(999)),
            user_id: f.alice,
            content: "orphan".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, ForumError::NotFound);
    assert_eq!(f.comments_on_post().await, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Soft Delete
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_soft_delete_keeps_structure() {
    let f = forum().await;
    let c1 = f.comment(None, f.bob, "will be removed").await;
    let c2 = f.comment(Some(c1), f.alice, "survives").await;
    f.store.vote_comment(f.alice, c1, VoteValue::Up).await.unwrap();

    f.store.delete_comment(c1).await.unwrap();
    assert_eq!(f.comments_on_post().await, 1);

    let shell = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert!(shell.is_deleted);
    assert!(shell.deleted_at.is_some());
    assert!(shell.content.is_empty());
    assert!(shell.summary.is_empty());
    assert_eq!(shell.path, CommentPath::root(c1));
    assert_eq!(shell.score, 1);
    assert_eq!(f.store.comment_vote_rows(c1), 1);

    let reply = f.store.get_comment(c2, &Viewer::Anonymous).await.unwrap();
    assert!(reply.path.is_descendant_of(&shell.path));

    assert_eq!(f.store.delete_comment(c1).await, Err(ForumError::NoRowsAffected));
    assert_eq!(f.comments_on_post().await, 1);

    // Karma still counts the deleted comment's score.
    assert_eq!(f.karma(f.bob).await, 1);
}

#[tokio::test]
async fn test_votes_on_deleted_content_are_rejected() {
    let f = forum().await;
    let c1 = f.comment(None, f.bob, "gone soon").await;
    f.store.delete_comment(c1).await.unwrap();

    let err = f.store.vote_comment(f.alice, c1, VoteValue::Up).await.unwrap_err();
    assert_eq!(err, ForumError::NoRowsAffected);
    assert_eq!(f.store.comment_vote_rows(c1), 0);

    f.store.delete_post(f.post).await.unwrap();
    let err = f.store.vote_post(f.bob, f.post, VoteValue::Up).await.unwrap_err();
    assert_eq!(err, ForumError::NoRowsAffected);
}

#[tokio::test]
async fn test_update_comment_regenerates_summary() {
    let f = forum().await;
    let c1 = f.comment(None, f.bob, "short take").await;
    let before = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert!(!before.has_long_content);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let long = "word ".repeat(200);
    f.store.update_comment(c1, &long).await.unwrap();
    let grown = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert_eq!(grown.content, long);
    assert!(grown.has_long_content);
    assert!(grown.summary.ends_with("..."));
    assert!(grown.summary.chars().count() < long.chars().count());
    assert!(grown.updated_at > before.updated_at);
    assert_eq!(grown.path, before.path);
    assert_eq!(grown.created_at, before.created_at);

    f.store.update_comment(c1, "short again").await.unwrap();
    let shrunk = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    assert!(!shrunk.has_long_content);
    assert_eq!(shrunk.summary, "short again");
    assert!(shrunk.updated_at >= grown.updated_at);

    let err = f
        .store
        .update_comment(CommentId::new(9_999), "nobody home")
        .await
        .unwrap_err();
    assert_eq!(err, ForumError::NoRowsAffected);
}

// ─────────────────────────────────────────────────────────────────────────────
// Voting
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_vote_changes_and_withdrawals() {
    let f = forum().await;
    let carol = user(&f.store, "carol").await;

    f.store.vote_post(f.bob, f.post, VoteValue::Up).await.unwrap();
    let tally = f.store.vote_post(carol, f.post, VoteValue::Up).await.unwrap();
    assert_eq!(tally.score, 2);
    assert_eq!(tally.author_karma, 2);

    let tally = f.store.vote_post(carol, f.post, VoteValue::Down).await.unwrap();
    assert_eq!(tally.score, 0);

    let tally = f.store.vote_post(f.bob, f.post, VoteValue::Neutral).await.unwrap();
    assert_eq!(tally.score, -1);
    assert_eq!(f.karma(f.alice).await, -1);

    // Withdrawn votes stay recorded.
    assert_eq!(f.store.post_vote_rows(f.post), 2);

    let viewed = f.store.get_post(f.post, &Viewer::User(carol)).await.unwrap();
    assert_eq!(viewed.my_vote, VoteValue::Down);
    let viewed = f.store.get_post(f.post, &Viewer::User(f.bob)).await.unwrap();
    assert_eq!(viewed.my_vote, VoteValue::Neutral);
}

#[tokio::test]
async fn test_karma_spans_posts_and_comments() {
    let f = forum().await;
    let c1 = f.comment(None, f.alice, "self reply").await;

    f.store.vote_post(f.bob, f.post, VoteValue::Up).await.unwrap();
    let tally = f.store.vote_comment(f.bob, c1, VoteValue::Up).await.unwrap();
    assert_eq!(tally.author_karma, 2);
    assert_eq!(f.karma(f.alice).await, 2);
    assert_eq!(f.karma(f.bob).await, 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Pinning
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pin_survives_comment_deletion() {
    let f = forum().await;
    let c1 = f.comment(None, f.bob, "best answer").await;

    let comment = f.store.get_comment(c1, &Viewer::Anonymous).await.unwrap();
    forum_kernel::types::validate_pin_target(f.post, &comment).unwrap();
    f.store.pin_comment(f.post, c1).await.unwrap();

    f.store.delete_comment(c1).await.unwrap();
    let post = f.store.get_post(f.post, &Viewer::Anonymous).await.unwrap();
    assert_eq!(post.pinned_comment_id, Some(c1));

    f.store.unpin_comment(f.post).await.unwrap();
    let post = f.store.get_post(f.post, &Viewer::Anonymous).await.unwrap();
    assert_eq!(post.pinned_comment_id, None);
}

#[tokio::test]
async fn test_pin_target_must_belong_to_post() {
    let f = forum().await;
    let other = f
        .store
        .create_post(&NewPost {
            topic_id: f.topic,
            user_id: f.bob,
            title: "Elsewhere".to_string(),
            content: "different thread".to_string(),
        })
        .await
        .unwrap();
    let foreign = f
        .store
        .create_comment(&NewComment {
            post_id: other,
            parent_id: None,
            user_id: f.bob,
            content: "not yours".to_string(),
        })
        .await
        .unwrap();

    let comment = f.store.get_comment(foreign, &Viewer::Anonymous).await.unwrap();
    let err = forum_kernel::types::validate_pin_target(f.post, &comment).unwrap_err();
    assert!(matches!(err, ForumError::Validation(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Follow Graph
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_follow_and_unfollow() {
    let f = forum().await;
    let name = "Web Development";

    assert_eq!(
        f.store.unfollow_topic(f.bob, name).await,
        Err(ForumError::NoRowsAffected)
    );

    f.store.follow_topic(f.bob, name).await.unwrap();
    assert_eq!(
        f.store.follow_topic(f.bob, name).await,
        Err(ForumError::NoRowsAffected)
    );
    let topic = f.store.get_topic(name, &Viewer::User(f.bob)).await.unwrap();
    assert_eq!(topic.no_of_followers, 1);
    assert!(topic.is_following);

    let anonymous = f.store.get_topic(name, &Viewer::Anonymous).await.unwrap();
    assert!(!anonymous.is_following);

    f.store.unfollow_topic(f.bob, name).await.unwrap();
    let topic = f.store.get_topic(name, &Viewer::User(f.bob)).await.unwrap();
    assert_eq!(topic.no_of_followers, 0);
    assert!(!topic.is_following);

    assert_eq!(
        f.store.follow_topic(f.bob, "Gardening").await,
        Err(ForumError::NotFound)
    );
}
