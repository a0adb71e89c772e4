//! OpenAI-compatible chat completion client with bounded retry.
//!
//! Every generative boundary (decomposer, judge, executors, reporter) shares
//! one client. Configured from the environment: `LLM_API_KEY` (required),
//! `LLM_BASE_URL` and `LLM_MODEL` (optional).

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use research_orchestrator_sdk::log_warning;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_RETRIES: u32 = 2;

/// Chat completion client shared by all LLM-backed boundaries.
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build a client from `LLM_API_KEY` / `LLM_BASE_URL` / `LLM_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("LLM_API_KEY")
            .context("LLM_API_KEY is not set (required for all generative boundaries)")?;
        let base_url = env::var("LLM_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, base_url, model))
    }

    /// Send one system+user exchange and return the assistant text.
    ///
    /// Transient failures (429/5xx/network) are retried with doubling delay,
    /// at most [`MAX_RETRIES`] times.
    pub async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
        };

        let mut attempt = 0;
        loop {
            match self.execute(&request).await {
                Ok(content) => return Ok(content),
                Err(error) if attempt < MAX_RETRIES && is_transient(&error) => {
                    let delay = Duration::from_secs(1 << attempt);
                    log_warning!(
                        "Chat request failed ({}), retrying in {:?}",
                        error,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error.into_inner()),
            }
        }
    }

    async fn execute(&self, request: &ChatRequest) -> std::result::Result<String, ChatError> {
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(request)
            .send()
            .await
            .map_err(|e| ChatError {
                transient: true,
                error: anyhow::anyhow!("Chat request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let transient = status.as_u16() == 429 || status.is_server_error();
            return Err(ChatError {
                transient,
                error: anyhow::anyhow!("Chat API returned {}: {}", status, body),
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| ChatError {
            transient: false,
            error: anyhow::anyhow!("Failed to parse chat response: {}, body: {}", e, body),
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| ChatError {
            transient: false,
            error: anyhow::anyhow!("No choices in chat response"),
        })?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

struct ChatError {
    transient: bool,
    error: anyhow::Error,
}

impl ChatError {
    fn into_inner(self) -> anyhow::Error {
        self.error
    }
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

fn is_transient(error: &ChatError) -> bool {
    error.transient
}

/// Chat completion request (OpenAI wire format).
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion response (OpenAI wire format).
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
