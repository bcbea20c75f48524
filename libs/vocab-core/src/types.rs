//! Core types for the vocabulary tutor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithm::SchedulingResult;

/// Easiness factor given to a freshly added term.
pub const INITIAL_EFACTOR: f64 = 2.5;

/// Lowest easiness factor the scheduler will ever produce.
pub const MINIMUM_EFACTOR: f64 = 1.3;

/// Recall quality for one review, 0 (blackout) to 5 (perfect).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Grade(u8);

impl Grade {
    pub const MAX: u8 = 5;

    /// Create from a value in 0..=5.
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Create from any integer, clamping into 0..=5.
    pub fn clamped(value: i64) -> Self {
        Self(value.clamp(0, Self::MAX as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Grades of 3 and above count as successful recall.
    pub fn is_pass(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for Grade {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("grade out of range: {value}"))
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

/// One entry of a term's review history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewed_at: DateTime<Utc>,
    pub grade: Grade,
}

/// Scheduling state of a term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub interval: i64,
    pub repetition: i64,
    pub efactor: f64,
    pub next_review_at: DateTime<Utc>,
    #[serde(default)]
    pub history: Vec<ReviewRecord>,
}

impl Progress {
    /// State of a term that has just been added: due immediately.
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            interval: 0,
            repetition: 0,
            efactor: INITIAL_EFACTOR,
            next_review_at: now,
            history: Vec::new(),
        }
    }

    /// Write a scheduling result and append the review that produced it.
    pub fn apply(&mut self, result: &SchedulingResult, record: ReviewRecord) {
        self.interval = result.interval;
        self.repetition = result.repetition;
        self.efactor = result.efactor;
        self.next_review_at = result.next_review_at;
        self.history.push(record);
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }
}

/// A vocabulary term together with its scheduling state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningItem {
    pub id: i64,
    pub content: String,
    pub definition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    pub progress: Progress,
}

/// Term parsed from a word list, not yet stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTerm {
    pub content: String,
    pub definition: String,
    pub context: Option<String>,
    pub line_number: usize,
}

/// Kind of study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    /// Self-graded flashcards.
    Standard,
    /// Model-generated quiz with model-graded answers.
    Ai,
}

impl Default for SessionType {
    fn default() -> Self {
        Self::Standard
    }
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Ai => "ai",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

/// Shape of a generated quiz question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizType {
    OpenEnded,
    MultipleChoice,
    FillInBlank,
}

impl QuizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenEnded => "open_ended",
            Self::MultipleChoice => "multiple_choice",
            Self::FillInBlank => "fill_in_blank",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open_ended" => Some(Self::OpenEnded),
            "multiple_choice" => Some(Self::MultipleChoice),
            "fill_in_blank" => Some(Self::FillInBlank),
            _ => None,
        }
    }
}

/// Question generated for one term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    #[serde(rename = "type")]
    pub quiz_type: QuizType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Graded answer returned by the grading oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub grade: Grade,
    pub feedback: String,
    pub ideal_answer: String,
}

/// Singleton learner profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub xp: i64,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_quiz_type: Option<QuizType>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            xp: 0,
            language: "English".to_string(),
            preferred_quiz_type: None,
        }
    }
}
