//! Text generation — the backend seam for the drafter and the LLM reviewer.
//!
//! `TextGenerator` is the only way the agents reach a model. The production
//! client speaks the OpenAI-compatible chat-completions protocol; tests swap
//! in scripted generators.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::LlmEndpoint;

/// One chat-completion request: system instructions plus a user message.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation backend disabled: {0}")]
    Disabled(String),

    #[error("generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("backend returned an empty completion")]
    Empty,
}

/// A text-generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;

    /// Label used in logs and `Degraded::served_by`.
    fn name(&self) -> &str {
        "llm"
    }
}

// ── OpenAI-compatible client ────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Chat-completions client for Groq, vLLM, llama.cpp and friends.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(endpoint: &LlmEndpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: endpoint.url.trim_end_matches('/').to_string(),
            model: endpoint.model.clone(),
            api_key: endpoint.api_key.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let mut http = self
            .client
            .post(format!("{}/chat/completions", self.url))
            .json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(model = %self.model, status, "Generation request rejected");
            return Err(GenerationError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(GenerationError::Empty);
        }
        debug!(model = %self.model, chars = content.len(), "Generation complete");
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Stand-in when no backend is configured. Every call fails, so the
/// drafter serves fallbacks and the LLM reviewer fails closed.
#[derive(Debug, Clone)]
pub struct DisabledGenerator {
    reason: String,
}

impl DisabledGenerator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, GenerationError> {
        Err(GenerationError::Disabled(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

/// Client for `endpoint`, or a disabled client when it cannot be called.
pub fn generator_for(endpoint: &LlmEndpoint) -> Arc<dyn TextGenerator> {
    if endpoint.is_usable() {
        Arc::new(OpenAiGenerator::new(endpoint))
    } else {
        warn!(
            url = %endpoint.url,
            "No API key configured; generation disabled, tickets will degrade to fallbacks"
        );
        Arc::new(DisabledGenerator::new("no API key configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            system: "sys".into(),
            user: "hello".into(),
            temperature: 0.3,
            max_tokens: 50,
        }
    }

    #[tokio::test]
    async fn test_disabled_generator_always_fails() {
        let generator = DisabledGenerator::new("offline");
        let err = generator.generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Disabled(ref r) if r == "offline"));
        assert_eq!(generator.name(), "disabled");
    }

    #[test]
    fn test_generator_for_hosted_without_key_is_disabled() {
        let endpoint = LlmEndpoint {
            url: crate::config::DEFAULT_LLM_URL.into(),
            model: "m".into(),
            api_key: None,
        };
        assert_eq!(generator_for(&endpoint).name(), "disabled");

        let local = LlmEndpoint {
            url: "http://localhost:8080/v1/".into(),
            ..endpoint
        };
        assert_eq!(generator_for(&local).name(), "m");
    }

    #[test]
    fn test_chat_request_shape() {
        let body = ChatRequest {
            model: "llama3-8b-8192",
            messages: vec![ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 500,
            temperature: 0.3,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "llama3-8b-8192");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
    }

    #[test]
    fn test_chat_response_missing_content() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant"}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }

    #[test]
    fn test_status_error_display() {
        let err = GenerationError::Status {
            status: 429,
            body: "rate limited".into(),
        };
        assert_eq!(err.to_string(), "HTTP 429: rate limited");
    }
}
