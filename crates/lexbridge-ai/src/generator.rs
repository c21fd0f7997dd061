//! Remote generation adapter.
//!
//! Calls an OpenAI-compatible `/v1/chat/completions` endpoint at zero
//! sampling temperature, so a fixed prompt and context produce a
//! reproducible answer.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use lexbridge_core::ModelEndpoint;

use crate::AiError;

/// Text generation adapter.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One completion for a system prompt and a user message.
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError>;
}

/// Generation client for an OpenAI-compatible HTTP endpoint.
pub struct RemoteGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatTurn<'a>>,
}

#[derive(Serialize)]
struct ChatTurn<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

impl RemoteGenerator {
    pub fn new(endpoint: &ModelEndpoint, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: endpoint.base_url.clone(),
            api_key: endpoint.api_key.clone(),
            model: endpoint.model.clone(),
            timeout,
        }
    }
}

#[async_trait]
impl TextGenerator for RemoteGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, AiError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            // Zero temperature: answers must be reproducible for a fixed
            // context.
            temperature: 0.0,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: system,
                },
                ChatTurn {
                    role: "user",
                    content: user,
                },
            ],
        };

        debug!(model = %self.model, "generation request");
        let resp = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AiError::GenerationUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AiError::GenerationUnavailable(format!(
                "server returned {status}: {body}"
            )));
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::GenerationUnavailable(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::GenerationUnavailable("no choices in response".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_at_zero_temperature() {
        let req = ChatRequest {
            model: "gpt-4o-mini",
            temperature: 0.0,
            messages: vec![
                ChatTurn {
                    role: "system",
                    content: "s",
                },
                ChatTurn {
                    role: "user",
                    content: "u",
                },
            ],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
    }

    #[test]
    fn response_content_parses() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": "VERIFIED"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "VERIFIED");
    }
}
