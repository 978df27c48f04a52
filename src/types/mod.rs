//! Core row and value types for the forum kernel.

pub mod ids;
pub mod path;
pub mod summary;
pub mod vote;
pub mod viewer;
pub mod user;
pub mod topic;
pub mod post;
pub mod comment;

pub use ids::{UserId, TopicId, PostId, CommentId};
pub use path::{CommentPath, PathParseError};
pub use summary::{Summary, COMMENT_SUMMARY_LENGTH, POST_SUMMARY_LENGTH, TRUNCATION_MARKER};
pub use vote::{VoteValue, VoteTally, InvalidVoteValue};
pub use viewer::{Viewer, ViewerToken, ViewerTokenError};
pub use user::{User, UserCredentials, NewUser, ProfileUpdate};
pub use topic::{Topic, TopicSummary, NewTopic, UserTopic, topic_name_from_slug};
pub use post::{Post, NewPost, PostUpdate, validate_pin_target};
pub use comment::{Comment, NewComment};
