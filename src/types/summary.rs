//! Summary generation for posts and comments.

use serde::{Deserialize, Serialize};

/// Maximum summary length for comments, in characters.
pub const COMMENT_SUMMARY_LENGTH: usize = 400;

/// Maximum summary length for posts, in characters.
pub const POST_SUMMARY_LENGTH: usize = 400;

/// Marker appended to truncated summaries.
pub const TRUNCATION_MARKER: &str = "...";

/// A derived preview of some content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Preview text.
    pub text: String,
    /// Whether the content was longer than the preview.
    pub truncated: bool,
}

impl Summary {
    /// Summarize `content`, trimming surrounding whitespace and cutting at
    /// `max_chars` characters.
    pub fn generate(content: &str, max_chars: usize) -> Self {
        let trimmed = content.trim();
        match trimmed.char_indices().nth(max_chars) {
            None => Self {
                text: trimmed.to_string(),
                truncated: false,
            },
            Some((cut, _)) => {
                let mut text = String::with_capacity(cut + TRUNCATION_MARKER.len());
                text.push_str(&trimmed[..cut]);
                text.push_str(TRUNCATION_MARKER);
                Self {
                    text,
                    truncated: true,
                }
            }
        }
    }

    /// Summary for comment content.
    pub fn for_comment(content: &str) -> Self {
        Self::generate(content, COMMENT_SUMMARY_LENGTH)
    }

    /// Summary for post content.
    pub fn for_post(content: &str) -> Self {
        Self::generate(content, POST_SUMMARY_LENGTH)
    }
}
