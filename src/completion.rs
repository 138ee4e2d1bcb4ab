//! Chat completion collaborator: trait plus the OpenAI-backed
//! implementation.
//!
//! Uses the same retry strategy as the embedding client: 429/5xx/network
//! errors back off and retry, other client errors fail immediately.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::ChatConfig;
use crate::error::{Result, TomeError};

/// One message in a completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Per-call overrides for generation parameters. `None` falls back to the
/// client's configured defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Generates text from a system prompt and a message list.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> Result<String>;
}

/// Completion client backed by the OpenAI chat completions API.
///
/// Requires `OPENAI_API_KEY` in the environment.
pub struct OpenAiChat {
    model: String,
    temperature: f32,
    max_retries: u32,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(config: &ChatConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable not set"))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiChat {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        opts: CompletionOptions,
    ) -> Result<String> {
        let unavailable = |reason: String| TomeError::CompletionUnavailable {
            operation: "chat completion".to_string(),
            reason,
        };

        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(serde_json::json!({
            "role": "system",
            "content": system_prompt,
        }));
        for message in messages {
            wire_messages.push(serde_json::json!({
                "role": message.role,
                "content": message.content,
            }));
        }

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": wire_messages,
            "temperature": opts.temperature.unwrap_or(self.temperature),
        });
        if let Some(max_tokens) = opts.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| unavailable(e.to_string()))?;
                        return parse_completion_response(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(unavailable(format!("HTTP {status}: {body_text}")));
                        continue;
                    }

                    return Err(unavailable(format!("HTTP {status}: {body_text}")));
                }
                Err(e) => {
                    last_err = Some(unavailable(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| unavailable("completion failed after retries".to_string())))
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json["choices"]
        .get(0)
        .and_then(|choice| choice["message"]["content"].as_str())
        .map(|content| content.to_string())
        .ok_or_else(|| TomeError::CompletionUnavailable {
            operation: "chat completion".to_string(),
            reason: "invalid completion response: missing choices[0].message.content"
                .to_string(),
        })
}
