//! OpenAI-compatible chat completions REST client
//!
//! A minimal client for OpenAI-compatible providers (Groq, Ollama, OpenAI)
//! with no domain-specific logic. Supports plain and JSON-mode completions.
//!
//! # Example
//!
//! ```rust,ignore
//! use chat_client::{ChatClient, ChatRequest, Message};
//!
//! let client = ChatClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("llama-3.3-70b-versatile")
//!         .message(Message::user("Hello!"))
//!         .json_mode(),
//! ).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{ChatError, Result};
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Pure chat completions API client.
#[derive(Clone)]
pub struct ChatClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    /// Create a new client with the given API key against the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Create from environment: `LLM_API_KEY` (required) and `LLM_BASE_URL`
    /// (optional, defaults to the Groq endpoint).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ChatError::Config("LLM_API_KEY not set".into()))?;
        let client = match std::env::var("LLM_BASE_URL") {
            Ok(url) => Self::new(api_key).with_base_url(url),
            Err(_) => Self::new(api_key),
        };
        Ok(client)
    }

    /// Set a custom base URL (for local Ollama, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completions API and get a response.
    /// A 429 status or rate-limit error body maps to `ChatError::RateLimited`
    /// so callers can rotate models.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                ChatError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 || error_text.to_lowercase().contains("rate_limit") {
                warn!(status = %status, "Provider rate limit hit");
                return Err(ChatError::RateLimited(error_text));
            }
            warn!(status = %status, error = %error_text, "Chat completion API error");
            return Err(ChatError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let raw: types::ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| ChatError::Parse(e.to_string()))?;

        let (content, usage) = {
            let usage = raw.usage;
            let content = raw
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default();
            (content, usage)
        };

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            response_length = content.len(),
            "Chat completion"
        );

        Ok(ChatResponse { content, usage })
    }
}
