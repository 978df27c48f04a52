//! Vote values and scoring outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::UserId;

/// A single user's vote on a post or comment.
///
/// `Neutral` is a recorded state ("vote withdrawn"), distinct from never
/// having voted; both contribute zero to the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum VoteValue {
    /// -1
    Down,
    /// 0
    Neutral,
    /// +1
    Up,
}

/// Error for vote values outside {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("vote value must be -1, 0 or 1, got {0}")]
pub struct InvalidVoteValue(pub i64);

impl VoteValue {
    /// Numeric weight of the vote.
    pub const fn weight(self) -> i16 {
        match self {
            Self::Down => -1,
            Self::Neutral => 0,
            Self::Up => 1,
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Self::Down),
            0 => Ok(Self::Neutral),
            1 => Ok(Self::Up),
            other => Err(InvalidVoteValue(other as i64)),
        }
    }
}

impl TryFrom<i64> for VoteValue {
    type Error = InvalidVoteValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        i16::try_from(value)
            .map_err(|_| InvalidVoteValue(value))
            .and_then(Self::try_from)
    }
}

impl From<VoteValue> for i16 {
    fn from(value: VoteValue) -> Self {
        value.weight()
    }
}

impl fmt::Display for VoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.weight())
    }
}

/// Committed state after a vote has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Re-derived score of the voted item.
    pub score: i64,
    /// Author of the voted item.
    pub author_id: UserId,
    /// Re-derived karma of the author.
    pub author_karma: i64,
}
