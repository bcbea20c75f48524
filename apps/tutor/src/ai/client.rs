//! HTTP client for an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use vocab_core::types::{Evaluation, Quiz};

use super::prompt::{self, ChatMessage};
use super::{AiError, EvaluationRequest, GradingOracle, QuizOracle, QuizRequest};
use crate::config::AiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

struct AiClientInner {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

/// Quiz and grading oracle backed by a chat completions API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct AiClient {
    inner: Arc<AiClientInner>,
}

impl AiClient {
    pub fn new(config: &AiConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            inner: Arc::new(AiClientInner {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                model: config.model.clone(),
                api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            }),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.api_key.is_some()
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, AiError> {
        let api_key = self.inner.api_key.as_deref().ok_or_else(|| {
            AiError::NotConfigured("set AI_API_KEY to use AI sessions".to_string())
        })?;

        let url = format!("{}/chat/completions", self.inner.base_url);
        let request = ChatRequest {
            model: &self.inner.model,
            messages,
            temperature: 0.4,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        tracing::debug!(model = %self.inner.model, "sending chat completion request");
        let resp = self
            .inner
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(AiError::Backend { status, message });
        }

        let response: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AiError::Parse("empty completion".to_string()))
    }
}

#[async_trait]
impl QuizOracle for AiClient {
    async fn generate_quiz(&self, request: &QuizRequest) -> Result<Quiz, AiError> {
        let content = self.complete(prompt::quiz_messages(request)).await?;
        prompt::parse_quiz(&content, request.preferred_quiz_type)
    }
}

#[async_trait]
impl GradingOracle for AiClient {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<Evaluation, AiError> {
        let content = self.complete(prompt::evaluation_messages(request)).await?;
        prompt::parse_evaluation(&content)
    }
}
