//! Materialized comment paths.
//!
//! A path is the dot-separated chain of comment ids from the thread root down
//! to the comment itself, e.g. `12.47.103`. Because every node carries its
//! full ancestry, subtree membership is a segment-prefix comparison instead of
//! a recursive walk. The PostgreSQL backend stores the same text in an `ltree`
//! column, where `a <@ b` matches [`CommentPath::is_descendant_of`] with
//! `or_self` semantics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::CommentId;

/// Error returned when parsing a malformed path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    /// The input had no segments.
    #[error("comment path is empty")]
    Empty,
    /// A segment was not a positive integer id.
    #[error("invalid comment path segment: {0:?}")]
    InvalidSegment(String),
}

/// Root-to-leaf ancestor chain of a comment, self-inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentPath {
    segments: Vec<CommentId>,
}

impl CommentPath {
    /// Path of a top-level comment: just its own id.
    pub fn root(id: CommentId) -> Self {
        Self { segments: vec![id] }
    }

    /// Path of a reply: the parent's path followed by the reply's id.
    pub fn child(&self, id: CommentId) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(id);
        Self { segments }
    }

    /// Build the path for a freshly inserted comment.
    pub fn for_new_comment(parent: Option<&CommentPath>, id: CommentId) -> Self {
        match parent {
            Some(parent) => parent.child(id),
            None => Self::root(id),
        }
    }

    /// Id of the comment this path belongs to.
    pub fn leaf(&self) -> CommentId {
        // Construction guarantees at least one segment.
        self.segments[self.segments.len() - 1]
    }

    /// Id of the thread's top-level comment.
    pub fn root_id(&self) -> CommentId {
        self.segments[0]
    }

    /// Number of segments; a top-level comment has depth 1.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Ancestor ids, root first, excluding the comment itself.
    pub fn ancestors(&self) -> &[CommentId] {
        &self.segments[..self.segments.len() - 1]
    }

    /// All segments, root first.
    pub fn segments(&self) -> &[CommentId] {
        &self.segments
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &CommentPath) -> bool {
        other.segments.len() > self.segments.len()
            && other.segments.starts_with(&self.segments)
    }

    /// True if `self` is a strict descendant of `other`.
    pub fn is_descendant_of(&self, other: &CommentPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// True if `self` equals `other` or lies beneath it (ltree `<@`).
    pub fn is_within(&self, other: &CommentPath) -> bool {
        self.segments.starts_with(&other.segments)
    }
}

impl fmt::Display for CommentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for CommentPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PathParseError::Empty);
        }
        let segments = s
            .split('.')
            .map(|part| match part.parse::<i64>() {
                Ok(raw) if raw > 0 => Ok(CommentId::new(raw)),
                _ => Err(PathParseError::InvalidSegment(part.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }
}

impl TryFrom<String> for CommentPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CommentPath> for String {
    fn from(path: CommentPath) -> Self {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> CommentPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_root_and_child() {
        let root = CommentPath::root(CommentId::new(12));
        let child = root.child(CommentId::new(47));
        let grandchild = child.child(CommentId::new(103));

        assert_eq!(root.to_string(), "12");
        assert_eq!(grandchild.to_string(), "12.47.103");
        assert_eq!(grandchild.leaf(), CommentId::new(103));
        assert_eq!(grandchild.root_id(), CommentId::new(12));
        assert_eq!(grandchild.depth(), 3);
        assert_eq!(grandchild.ancestors(), &[CommentId::new(12), CommentId::new(47)]);
    }

    #[test]
    fn test_ancestry_is_segment_based() {
        // "1.2" must not be treated as an ancestor of "1.23".
        assert!(!path("1.2").is_ancestor_of(&path("1.23")));
        assert!(path("1.2").is_ancestor_of(&path("1.2.3")));
        assert!(path("1.2.3").is_descendant_of(&path("1")));
        assert!(!path("1.2").is_ancestor_of(&path("1.2")));
    }

    #[test]
    fn test_is_within_includes_self() {
        assert!(path("4.5").is_within(&path("4.5")));
        assert!(path("4.5.6").is_within(&path("4.5")));
        assert!(!path("4").is_within(&path("4.5")));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<CommentPath>(), Err(PathParseError::Empty));
        assert!(matches!(
            "1..2".parse::<CommentPath>(),
            Err(PathParseError::InvalidSegment(_))
        ));
        assert!("1.x".parse::<CommentPath>().is_err());
        assert!("0".parse::<CommentPath>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&path("12.47")).unwrap();
        assert_eq!(json, "\"12.47\"");
        let back: CommentPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path("12.47"));
    }
}
