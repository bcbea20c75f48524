//! Grade choices offered for manual rating.
//!
//! The scheduler accepts the whole 0..=5 range; which grades the learner can
//! pick by hand is a presentation policy kept here.

use crate::types::Grade;
use serde::{Deserialize, Serialize};

/// One labeled grade button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOption {
    pub label: String,
    pub grade: Grade,
}

/// Ordered set of grade buttons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeOptions(Vec<GradeOption>);

impl GradeOptions {
    pub fn new(options: Vec<GradeOption>) -> Self {
        Self(options)
    }

    /// Blackout, Difficult, Correct, Perfect. Grades 1 and 2 are not offered.
    pub fn manual() -> Self {
        Self(
            [("Blackout", 0), ("Difficult", 3), ("Correct", 4), ("Perfect", 5)]
                .into_iter()
                .map(|(label, value)| GradeOption {
                    label: label.to_string(),
                    grade: Grade::clamped(value),
                })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &GradeOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Option at a zero-based position.
    pub fn get(&self, index: usize) -> Option<&GradeOption> {
        self.0.get(index)
    }

    /// Case-insensitive lookup by label.
    pub fn find(&self, label: &str) -> Option<&GradeOption> {
        self.0.iter().find(|o| o.label.eq_ignore_ascii_case(label.trim()))
    }
}

impl Default for GradeOptions {
    fn default() -> Self {
        Self::manual()
    }
}
