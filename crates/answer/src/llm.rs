//! Language model client
//!
//! Treats the model as an opaque `prompt -> text` function. The production
//! client talks to an OpenAI-compatible chat-completions endpoint with an
//! explicit request timeout; transient failures are retried with
//! exponential backoff, terminal failures propagate unmodified as
//! dependency errors.

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use docchat_common::config::LlmConfig;
use docchat_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Trait for answer generation
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate one text answer for a fully-assembled prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiChatClient {
    client: reqwest::Client,
    config: LlmConfig,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiChatClient {
    /// Create a new client from configuration
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.config.max_tokens,
        };

        let mut builder = self.client.post(&self.config.endpoint);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::DependencyTimeout {
                        service: "llm".to_string(),
                        timeout_ms: self.config.timeout_secs * 1000,
                    }
                } else {
                    AppError::Dependency {
                        service: "llm".to_string(),
                        message: format!("Request failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Dependency {
                service: "llm".to_string(),
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| AppError::Dependency {
            service: "llm".to_string(),
            message: format!("Failed to parse response: {}", e),
        })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Dependency {
                service: "llm".to_string(),
                message: "Empty response".to_string(),
            })
    }

    /// Whether a failure is worth retrying
    fn is_transient(error: &AppError) -> bool {
        match error {
            AppError::DependencyTimeout { .. } => true,
            AppError::Dependency { message, .. } => {
                message.contains("Request failed")
                    || message.contains("API error 429")
                    || message.contains("API error 5")
            }
            _ => false,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(200))
            .with_max_elapsed_time(Some(Duration::from_secs(
                self.config.timeout_secs * self.config.max_retries.max(1) as u64,
            )))
            .build();

        backoff::future::retry(policy, || async move {
            self.make_request(prompt).await.map_err(|e| {
                if Self::is_transient(&e) {
                    warn!(error = %e, "LLM request failed, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .await
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Mock client for testing
///
/// Records every prompt it receives and returns a canned answer.
pub struct MockLlm {
    answer: String,
    fail: bool,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl MockLlm {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            fail: false,
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// A mock that always fails with a dependency error
    pub fn failing() -> Self {
        Self {
            answer: String::new(),
            fail: true,
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Prompts seen so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail {
            return Err(AppError::Dependency {
                service: "llm".to_string(),
                message: "mock failure".to_string(),
            });
        }
        Ok(self.answer.clone())
    }

    fn model_name(&self) -> &str {
        "mock-llm"
    }
}
