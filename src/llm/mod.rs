//! LLM module - hosted chat completion
//!
//! Groq exposes an OpenAI-compatible chat completions API.
//! source: https://console.groq.com/docs/openai

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

// ============================================================================
// ChatModel Trait
// ============================================================================

/// Single-prompt text generation
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the rendered prompt, return the raw model text
    async fn complete(&self, prompt: &str) -> Result<String>;

    fn name(&self) -> &str;
}

// ============================================================================
// Groq
// ============================================================================

#[derive(Debug)]
pub struct GroqChat {
    api_key: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GroqChat {
    /// Temperature is fixed at 0
    pub fn new(api_key: String, model: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            api_key,
            model: model.into(),
            temperature: 0.0,
            client,
        })
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl ChatModel for GroqChat {
    async fn complete(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Calling {} ({} prompt chars)", self.model, prompt.len());

        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&self.request(prompt))
            .send()
            .await
            .context("Failed to send chat request")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read chat response body")?;

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiError>(&body) {
                anyhow::bail!("Groq API error ({}): {}", status, error.error.message);
            }
            anyhow::bail!("Groq API error ({}): {}", status, body);
        }

        parse_completion(&body)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn parse_completion(body: &str) -> Result<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).context("Failed to parse chat response")?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_deterministic_single_turn() {
        let chat = GroqChat::new("fake".to_string(), "llama-3.3-70b-versatile").unwrap();
        let json = serde_json::to_value(chat.request("Hello")).unwrap();

        assert_eq!(json["model"], "llama-3.3-70b-versatile");
        assert_eq!(json["temperature"], 0.0);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn test_parse_completion() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Namaskar"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "Namaskar");
    }

    #[test]
    fn test_parse_completion_empty_choices() {
        assert_eq!(parse_completion(r#"{"choices":[]}"#).unwrap(), "");
    }

    #[test]
    fn test_parse_completion_invalid() {
        assert!(parse_completion("not json").is_err());
    }
}
