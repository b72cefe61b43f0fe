//! OpenAI-compatible chat-completions client

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::LanguageModel;
use crate::prompt::Prompt;
use crate::{Error, Result};

/// Connection settings for an OpenAI-compatible endpoint
#[derive(Debug)]
pub struct OpenAiChatConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub api_key: SecretString,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Per-request HTTP timeout
    pub timeout: Duration,
}

/// Chat-completions client for any OpenAI-compatible API
pub struct OpenAiChat {
    client: reqwest::Client,
    config: OpenAiChatConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiChat {
    /// Create a client
    ///
    /// # Errors
    ///
    /// Returns `Config` if the API key is empty or the HTTP client cannot be built
    pub fn new(config: OpenAiChatConfig) -> Result<Self> {
        if config.api_key.expose_secret().is_empty() {
            return Err(Error::Config("API key required for the language model".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    /// Flatten a prompt into chat messages: system, history, new user turn
    fn messages(prompt: &Prompt) -> Vec<ChatMessage<'_>> {
        let mut messages = Vec::with_capacity(prompt.history.len() + 2);
        messages.push(ChatMessage {
            role: "system",
            content: &prompt.system,
        });
        messages.extend(prompt.history.iter().map(|turn| ChatMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.user,
        });
        messages
    }
}

#[async_trait]
impl LanguageModel for OpenAiChat {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: Self::messages(prompt),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::llm(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "chat completion request rejected");
            return Err(Error::llm(format!("HTTP {status}: {body}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::llm(format!("failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| Error::llm("response contained no reply text"))
    }
}
