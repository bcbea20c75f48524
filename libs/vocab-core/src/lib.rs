//! Core library of the vocabulary tutor.
//!
//! Provides:
//! - Modified SM-2 scheduler computing the next review of a term
//! - Study session state machine (pure reducer, no I/O)
//! - XP reward rules and manual grade options
//! - Word list parser
//! - Shared types (LearningItem, Progress, Grade, Quiz, etc.)

pub mod algorithm;
pub mod error;
pub mod grading;
pub mod parser;
pub mod session;
pub mod types;
pub mod xp;

pub use algorithm::{compute_next_review, SchedulingResult};
pub use error::{ParseError, Result, TransitionError};
pub use grading::{GradeOption, GradeOptions};
pub use parser::parse;
pub use session::{
    AiFailure, Effect, EvaluatingStage, FeedbackKind, SessionEvent, SessionMode, SessionState,
};
pub use types::{
    Evaluation, Grade, LearningItem, Profile, Progress, Quiz, QuizType, RawTerm, ReviewRecord,
    SessionType,
};
pub use xp::XpPolicy;
