//! Prompts sent to the model and parsing of its JSON replies.

use serde::{Deserialize, Serialize};
use vocab_core::types::{Evaluation, Grade, Quiz, QuizType};

use super::{AiError, EvaluationRequest, QuizRequest};

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub fn quiz_messages(request: &QuizRequest) -> Vec<ChatMessage> {
    let quiz_type = match request.preferred_quiz_type {
        Some(ty) => format!("Use the quiz type \"{}\".", ty.as_str()),
        None => "Pick whichever quiz type fits the term best.".to_string(),
    };
    let context = request
        .context
        .as_deref()
        .map(|c| format!("\nExample of use: {c}"))
        .unwrap_or_default();

    vec![
        ChatMessage::system(format!(
            "You are a Socratic vocabulary tutor. Write one short question, in {}, \
             that checks whether the learner understands a term without giving the answer away. \
             Quiz types: open_ended, multiple_choice, fill_in_blank. {quiz_type} \
             Reply with a JSON object: {{\"question\": string, \"type\": string, \
             \"options\": [string] (only for multiple_choice)}}.",
            request.language
        )),
        ChatMessage::user(format!(
            "Term: {}\nDefinition: {}{context}",
            request.term, request.definition
        )),
    ]
}

pub fn evaluation_messages(request: &EvaluationRequest) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You grade a learner's answer to a vocabulary question on a 0-5 scale: \
             0 no recall, 3 correct with serious difficulty, 4 correct with hesitation, \
             5 perfect. Write feedback in {}. Reply with a JSON object: \
             {{\"grade\": integer, \"feedback\": string, \"idealAnswer\": string}}.",
            request.language
        )),
        ChatMessage::user(format!(
            "Term: {}\nDefinition: {}\nQuestion: {}\nLearner's answer: {}",
            request.term, request.definition, request.question, request.answer
        )),
    ]
}

#[derive(Debug, Deserialize)]
struct QuizReply {
    question: String,
    #[serde(rename = "type", default)]
    quiz_type: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct EvaluationReply {
    grade: f64,
    #[serde(default)]
    feedback: String,
    #[serde(rename = "idealAnswer", alias = "ideal_answer", default)]
    ideal_answer: String,
}

/// Parse a quiz reply. Unknown types fall back to the requested type, and a
/// multiple choice question without options becomes open ended.
pub fn parse_quiz(content: &str, preferred: Option<QuizType>) -> Result<Quiz, AiError> {
    let reply: QuizReply = serde_json::from_str(strip_fences(content))
        .map_err(|e| AiError::Parse(e.to_string()))?;

    if reply.question.trim().is_empty() {
        return Err(AiError::Parse("empty question".to_string()));
    }

    let quiz_type = reply
        .quiz_type
        .as_deref()
        .and_then(QuizType::from_str)
        .or(preferred)
        .unwrap_or(QuizType::OpenEnded);
    let options = reply.options.filter(|o| !o.is_empty());

    let (quiz_type, options) = match (quiz_type, options) {
        (QuizType::MultipleChoice, None) => (QuizType::OpenEnded, None),
        (QuizType::MultipleChoice, options) => (QuizType::MultipleChoice, options),
        (other, _) => (other, None),
    };

    Ok(Quiz {
        question: reply.question.trim().to_string(),
        quiz_type,
        options,
    })
}

/// Parse a grading reply, clamping the grade into 0..=5.
pub fn parse_evaluation(content: &str) -> Result<Evaluation, AiError> {
    let reply: EvaluationReply = serde_json::from_str(strip_fences(content))
        .map_err(|e| AiError::Parse(e.to_string()))?;

    if !reply.grade.is_finite() {
        return Err(AiError::Parse(format!("invalid grade: {}", reply.grade)));
    }

    Ok(Evaluation {
        grade: Grade::clamped(reply.grade.round() as i64),
        feedback: reply.feedback,
        ideal_answer: reply.ideal_answer,
    })
}

/// Models sometimes wrap JSON in a markdown code fence.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.strip_suffix("```").unwrap_or(rest).trim()
        }
        None => trimmed,
    }
}
