//! OpenAI-compatible chat completions client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clients::traits::{ChatModel, ModelError};
use crate::config::ModelConfig;

pub struct OpenAiChatModel {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    attempts: u32,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    n: u32,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// System message, prior assistant replies in order, then the new user turn
pub(crate) fn build_messages<'a>(
    system: &'a str,
    user: &'a str,
    history: &'a [String],
) -> Vec<ChatMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage {
        role: "system",
        content: system,
    });
    for prev in history {
        messages.push(ChatMessage {
            role: "assistant",
            content: prev,
        });
    }
    messages.push(ChatMessage {
        role: "user",
        content: user,
    });
    messages
}

impl OpenAiChatModel {
    pub fn new(api_key: String, cfg: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| ModelError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            model: cfg.name.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            attempts: cfg.retries.clamp(1, 5),
        })
    }

    async fn attempt(&self, body: &ChatRequest<'_>) -> Result<String, ModelError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ModelError::ParseError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(ModelError::Empty)
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        history: &[String],
    ) -> Result<String, ModelError> {
        debug!(
            "Requesting completion (model={}, system_chars={}, user_chars={}, history={})",
            self.model,
            system.len(),
            user.len(),
            history.len()
        );

        let body = ChatRequest {
            model: &self.model,
            messages: build_messages(system, user, history),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            n: 1,
        };

        // Retry with simple exponential backoff
        let mut last_err = ModelError::Empty;
        for i in 0..self.attempts {
            match self.attempt(&body).await {
                Ok(text) => {
                    debug!("Completion received ({} chars)", text.len());
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Completion attempt {}/{} failed: {}", i + 1, self.attempts, e);
                    last_err = e;
                    if i + 1 < self.attempts {
                        let delay_ms = 200u64 * (1u64 << i);
                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                    }
                }
            }
        }

        Err(last_err)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_keep_history_order() {
        let history = vec!["step one".to_string(), "step two".to_string()];
        let messages = build_messages("sys", "next", &history);
        let roles: Vec<&str> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["system", "assistant", "assistant", "user"]);
        assert_eq!(messages[1].content, "step one");
        assert_eq!(messages[2].content, "step two");
        assert_eq!(messages[3].content, "next");
    }

    #[test]
    fn endpoint_joins_base_url() {
        let cfg = ModelConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            retries: 0,
            ..ModelConfig::default()
        };
        let model = OpenAiChatModel::new("k".to_string(), &cfg).unwrap();
        assert_eq!(model.endpoint, "http://localhost:8080/v1/chat/completions");
        assert_eq!(model.attempts, 1);
        assert_eq!(model.name(), "gpt-4o");
    }

    #[test]
    fn request_body_shape() {
        let history: Vec<String> = Vec::new();
        let body = ChatRequest {
            model: "gpt-4o",
            messages: build_messages("s", "u", &history),
            temperature: 0.7,
            max_tokens: 2000,
            n: 1,
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["model"], "gpt-4o");
        assert_eq!(v["n"], 1);
        assert_eq!(v["max_tokens"], 2000);
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "u");
    }
}
