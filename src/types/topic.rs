//! Topic rows and the follow edge.

use serde::{Deserialize, Serialize};

use super::ids::{TopicId, UserId};

/// A topic as seen by a particular viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Topic id.
    pub id: TopicId,
    /// Unique display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Live (non-deleted) posts in the topic.
    pub no_of_posts: i64,
    /// Users following the topic.
    pub no_of_followers: i64,
    /// Whether the viewer follows the topic (false for anonymous viewers).
    pub is_following: bool,
}

/// Lightweight `(id, name)` projection for navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
    /// Topic id.
    pub id: TopicId,
    /// Display name.
    pub name: String,
}

/// Input for creating a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTopic {
    /// Unique display name.
    pub name: String,
    /// Description.
    pub description: String,
}

/// A follow edge between a user and a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserTopic {
    /// Follower.
    pub user_id: UserId,
    /// Followed topic.
    pub topic_id: TopicId,
}

/// Turn a URL slug back into a topic name: `"web-development"` becomes
/// `"Web Development"`.
pub fn topic_name_from_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_to_name() {
        assert_eq!(topic_name_from_slug("web-development"), "Web Development");
        assert_eq!(topic_name_from_slug("rust"), "Rust");
        assert_eq!(topic_name_from_slug("AI-news"), "Ai News");
        assert_eq!(topic_name_from_slug(""), "");
    }
}
