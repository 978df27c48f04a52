//! Property tests for comment paths, counters and vote scoring.

use forum_kernel::store::{CommentStore, PostStore, TopicStore, UserStore, VoteStore};
use forum_kernel::{
    CommentId, CommentPath, InMemoryForumStore, NewComment, NewPost, NewTopic, NewUser, PostId,
    UserId, Viewer, VoteValue,
};
use proptest::prelude::*;

const MAX_COMMENTS: usize = 24;
const VOTERS: usize = 6;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

async fn seeded(voters: usize) -> (InMemoryForumStore, Vec<UserId>, PostId) {
    let store = InMemoryForumStore::new();
    let mut users = Vec::new();
    for i in 0..=voters {
        users.push(
            store
                .create_user(&NewUser {
                    email: format!("user{}@example.com", i),
                    username: format!("user{}", i),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap(),
        );
    }
    let topic = store
        .create_topic(&NewTopic {
            name: "Properties".to_string(),
            description: String::new(),
        })
        .await
        .unwrap();
    let post = store
        .create_post(&NewPost {
            topic_id: topic,
            user_id: users[0],
            title: "Generated thread".to_string(),
            content: "body".to_string(),
        })
        .await
        .unwrap();
    (store, users, post)
}

fn vote_value() -> impl Strategy<Value = VoteValue> {
    prop_oneof![
        Just(VoteValue::Down),
        Just(VoteValue::Neutral),
        Just(VoteValue::Up),
    ]
}

/// For comment `i`, `None` starts a new root and `Some(k)` replies to
/// comment `k % i`.
fn thread_shape() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::of(any::<usize>()), 1..MAX_COMMENTS).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, choice)| if i == 0 { None } else { choice.map(|k| k % i) })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn comment_path_extends_parent_path(shape in thread_shape()) {
        let rt = runtime();
        rt.block_on(async {
            let (store, users, post) = seeded(1).await;
            let mut ids: Vec<CommentId> = Vec::new();
            for parent in &shape {
                let id = store
                    .create_comment(&NewComment {
                        post_id: post,
                        parent_id: parent.map(|k| ids[k]),
                        user_id: users[1],
                        content: "generated".to_string(),
                    })
                    .await
                    .unwrap();
                ids.push(id);
            }

            for (i, parent) in shape.iter().enumerate() {
                let comment = store.get_comment(ids[i], &Viewer::Anonymous).await.unwrap();
                let expected = match parent {
                    None => CommentPath::root(ids[i]),
                    Some(k) => store
                        .get_comment(ids[*k], &Viewer::Anonymous)
                        .await
                        .unwrap()
                        .path
                        .child(ids[i]),
                };
                assert_eq!(comment.path, expected);
                assert_eq!(comment.path.leaf(), ids[i]);

                let replies = shape.iter().filter(|p| **p == Some(i)).count() as i64;
                assert_eq!(comment.no_of_replies, replies);
            }
        });
    }

    #[test]
    fn comment_count_tracks_live_comments(
        shape in thread_shape(),
        deletions in prop::collection::vec(any::<usize>(), 0..MAX_COMMENTS),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let (store, users, post) = seeded(1).await;
            let mut ids: Vec<CommentId> = Vec::new();
            for parent in &shape {
                let id = store
                    .create_comment(&NewComment {
                        post_id: post,
                        parent_id: parent.map(|k| ids[k]),
                        user_id: users[1],
                        content: "generated".to_string(),
                    })
                    .await
                    .unwrap();
                ids.push(id);
            }

            let mut deleted = std::collections::BTreeSet::new();
            for pick in deletions {
                let id = ids[pick % ids.len()];
                let outcome = store.delete_comment(id).await;
                // Deleting twice fails and changes nothing.
                assert_eq!(outcome.is_ok(), deleted.insert(id));
            }

            let live = (ids.len() - deleted.len()) as i64;
            let post = store.get_post(post, &Viewer::Anonymous).await.unwrap();
            assert_eq!(post.no_of_comments, live);
        });
    }

    #[test]
    fn score_is_order_independent(
        finals in prop::collection::vec(vote_value(), VOTERS)
            .prop_flat_map(|finals| {
                let order: Vec<usize> = (0..finals.len()).collect();
                (Just(finals), Just(order).prop_shuffle())
            }),
    ) {
        let (finals, order) = finals;
        let rt = runtime();
        rt.block_on(async {
            let (forward, users, post) = seeded(VOTERS).await;
            let (shuffled, _, _) = seeded(VOTERS).await;

            let mut last = None;
            for (i, value) in finals.iter().enumerate() {
                last = Some(forward.vote_post(users[i + 1], post, *value).await.unwrap());
            }
            let mut last_shuffled = None;
            for &i in &order {
                last_shuffled = Some(shuffled.vote_post(users[i + 1], post, finals[i]).await.unwrap());
            }

            let expected: i64 = finals.iter().map(|v| i64::from(v.weight())).sum();
            let forward = last.unwrap();
            let shuffled = last_shuffled.unwrap();
            assert_eq!(forward.score, expected);
            assert_eq!(shuffled.score, expected);
            assert_eq!(forward.author_karma, shuffled.author_karma);
        });
    }

    #[test]
    fn repeated_vote_is_a_no_op(history in prop::collection::vec((0..VOTERS, vote_value()), 1..20)) {
        let rt = runtime();
        rt.block_on(async {
            let (store, users, post) = seeded(VOTERS).await;
            let comment = store
                .create_comment(&NewComment {
                    post_id: post,
                    parent_id: None,
                    user_id: users[0],
                    content: "target".to_string(),
                })
                .await
                .unwrap();

            for (voter, value) in &history {
                let first = store.vote_comment(users[voter + 1], comment, *value).await.unwrap();
                let again = store.vote_comment(users[voter + 1], comment, *value).await.unwrap();
                assert_eq!(first, again);
            }

            let mut finals = std::collections::BTreeMap::new();
            for (voter, value) in &history {
                finals.insert(*voter, i64::from(value.weight()));
            }
            let stored = store.get_comment(comment, &Viewer::Anonymous).await.unwrap();
            assert_eq!(stored.score, finals.values().sum::<i64>());
            assert_eq!(store.comment_vote_rows(comment), finals.len());
        });
    }
}
