//! Language-model oracles for quiz generation and answer grading.

pub mod client;
pub mod prompt;

use async_trait::async_trait;
use vocab_core::types::{Evaluation, LearningItem, Quiz, QuizType};

pub use client::AiClient;

/// AI errors.
#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI is not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl AiError {
    /// Whether the learner has to fix settings before AI sessions can work.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConfigured(_) | Self::Backend { status: 401 | 403, .. }
        )
    }
}

/// Input for quiz generation.
#[derive(Debug, Clone)]
pub struct QuizRequest {
    pub term: String,
    pub definition: String,
    pub context: Option<String>,
    pub language: String,
    pub preferred_quiz_type: Option<QuizType>,
}

impl QuizRequest {
    pub fn for_item(
        item: &LearningItem,
        language: &str,
        preferred_quiz_type: Option<QuizType>,
    ) -> Self {
        Self {
            term: item.content.clone(),
            definition: item.definition.clone(),
            context: item.context.clone(),
            language: language.to_string(),
            preferred_quiz_type,
        }
    }
}

/// Input for answer grading.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub term: String,
    pub definition: String,
    pub question: String,
    pub answer: String,
    pub language: String,
}

impl EvaluationRequest {
    pub fn for_answer(item: &LearningItem, quiz: &Quiz, answer: &str, language: &str) -> Self {
        Self {
            term: item.content.clone(),
            definition: item.definition.clone(),
            question: quiz.question.clone(),
            answer: answer.to_string(),
            language: language.to_string(),
        }
    }
}

/// Generates a quiz question for one term.
#[async_trait]
pub trait QuizOracle: Send + Sync {
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Quiz, AiError>;
}

/// Scores a learner's answer from 0 to 5.
#[async_trait]
pub trait GradingOracle: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, AiError>;
}
