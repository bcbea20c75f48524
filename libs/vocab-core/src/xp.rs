//! Experience points awarded per graded review.

use crate::types::{Grade, SessionType};
use serde::{Deserialize, Serialize};

/// Reward function applied to a graded review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpPolicy {
    /// Self-graded flashcard review.
    Review,
    /// Quiz answered in a mentor session.
    Mentor,
}

impl XpPolicy {
    pub fn award(self, grade: Grade) -> i64 {
        match self {
            Self::Review => review_xp(grade),
            Self::Mentor => mentor_xp(grade),
        }
    }
}

impl SessionType {
    pub fn xp_policy(self) -> XpPolicy {
        match self {
            Self::Standard => XpPolicy::Review,
            Self::Ai => XpPolicy::Mentor,
        }
    }
}

/// `10 + 2 * grade`.
pub fn review_xp(grade: Grade) -> i64 {
    10 + i64::from(grade.value()) * 2
}

/// `15 + 3 * grade`.
pub fn mentor_xp(grade: Grade) -> i64 {
    15 + i64::from(grade.value()) * 3
}
