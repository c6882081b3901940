//! Extraction gateway: the single LLM touchpoint for the pipeline.
//!
//! Owns model rotation (rate-limited models are skipped until a cooldown
//! elapses), the JSON-mode fallback for providers that reject
//! `response_format`, and loose parsing of near-JSON output. Engines call
//! [`ExtractionGateway::discover`] and [`ExtractionGateway::extract_profile`]
//! and never see a raw completion.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chat_client::{
    truncate_to_char_boundary, ChatClient, ChatError, ChatRequest, ChatResponse, Message,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CrawlLimits;
use crate::events::{EventSink, ProgressEvent};
use crate::prompts;
use crate::salvage::parse_loose_json;
use crate::types::ExtractedProfile;

/// Seam over the chat completions call so the pipeline is testable without
/// a provider.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse, ChatError>;
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse, ChatError> {
        ChatClient::chat_completion(self, request).await
    }
}

/// One candidate row from a directory scan.
#[derive(Debug, Clone)]
pub struct DirectoryCandidate {
    pub name: String,
    pub profile_url: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub snippet: Option<String>,
}

impl DirectoryCandidate {
    /// Lenient conversion from one entry of the model's `professors` array.
    /// Entries without a usable name are dropped.
    fn from_value(value: &Value) -> Option<Self> {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.as_str())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Some(Self {
            name: text("name")?,
            profile_url: text("profile_url"),
            title: text("title"),
            email: text("email"),
            snippet: text("snippet"),
        })
    }
}

/// What kind of page the discovery scan saw.
#[derive(Debug, Clone)]
pub enum DiscoveryOutcome {
    /// The scanned page is a single professor's own profile.
    ProfilePage,
    /// A directory-style page listing candidate professors (possibly none).
    DirectoryListing(Vec<DirectoryCandidate>),
}

/// How long a rate-limited rotation sticks before resetting to the primary
/// model.
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

struct RotationState {
    /// Index of the model tried first on the next call.
    cursor: usize,
    last_rate_limit: Option<Instant>,
}

pub struct ExtractionGateway {
    api: Arc<dyn ChatApi>,
    models: Vec<String>,
    limits: CrawlLimits,
    cooldown: Duration,
    state: Mutex<RotationState>,
}

impl ExtractionGateway {
    pub fn new(api: Arc<dyn ChatApi>, models: Vec<String>, limits: CrawlLimits) -> Self {
        Self {
            api,
            models,
            limits,
            cooldown: RATE_LIMIT_COOLDOWN,
            state: Mutex::new(RotationState {
                cursor: 0,
                last_rate_limit: None,
            }),
        }
    }

    /// Override the rotation cooldown (tests).
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Scan a discovery page for research faculty. `None` means every model
    /// failed or returned unparseable output.
    pub async fn discover(
        &self,
        page_text: &str,
        url: &str,
        major: Option<&str>,
        sink: &dyn EventSink,
    ) -> Option<DiscoveryOutcome> {
        let text = truncate_to_char_boundary(page_text, self.limits.discovery_text_limit);
        let value = self
            .complete_json(prompts::discovery_messages(text, url, major), sink)
            .await?;

        if value
            .get("is_profile_page")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
        {
            return Some(DiscoveryOutcome::ProfilePage);
        }

        let candidates = value
            .get("professors")
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(DirectoryCandidate::from_value).collect())
            .unwrap_or_default();
        Some(DiscoveryOutcome::DirectoryListing(candidates))
    }

    /// Extract a full profile for one professor. Always returns a profile:
    /// when every model fails the record degrades to name-only with `error`
    /// set, so the professor is never silently dropped.
    pub async fn extract_profile(
        &self,
        page_text: &str,
        url: &str,
        professor_name: &str,
        search_context: Option<&str>,
        sink: &dyn EventSink,
    ) -> ExtractedProfile {
        let text = truncate_to_char_boundary(page_text, self.limits.profile_text_limit);
        let messages = prompts::profile_messages(text, url, professor_name, search_context);

        match self.complete_json(messages, sink).await {
            Some(value) => {
                let mut profile = ExtractedProfile::from_value(&value);
                if profile.professor_name.is_none() && profile.error.is_none() {
                    profile.professor_name = Some(professor_name.to_string());
                }
                profile
            }
            None => {
                let mut profile = ExtractedProfile::name_only(professor_name);
                profile.error = Some("extraction failed for all models".to_string());
                profile
            }
        }
    }

    /// Run one completion through the rotation, returning the first parseable
    /// JSON value.
    ///
    /// Rotation rules: start at the cursor; a rate limit records the time,
    /// moves the cursor past the failing model and surfaces an `Info` event
    /// so the watcher sees the switch; any other failure just tries the next
    /// model for this call. While a cooldown is active, a success
    /// parks the cursor past the model that served the request, keeping the
    /// round-robin moving instead of hammering one fallback. Once the
    /// cooldown elapses with no new rate limit, the cursor resets to the
    /// primary model.
    pub async fn complete_json(
        &self,
        messages: Vec<Message>,
        sink: &dyn EventSink,
    ) -> Option<Value> {
        let start = {
            let mut state = self.state.lock().ok()?;
            if let Some(at) = state.last_rate_limit {
                if at.elapsed() >= self.cooldown {
                    state.cursor = 0;
                    state.last_rate_limit = None;
                }
            }
            state.cursor
        };

        for offset in 0..self.models.len() {
            let index = (start + offset) % self.models.len();
            let model = &self.models[index];

            let content = match self.attempt(model, &messages).await {
                Ok(content) => content,
                Err(ChatError::RateLimited(body)) => {
                    warn!(model = %model, "Model rate limited, rotating");
                    debug!(body = %body, "Rate limit detail");
                    sink.emit(ProgressEvent::info(
                        "Rate limit hit. Switching to next model...",
                    ));
                    if let Ok(mut state) = self.state.lock() {
                        state.cursor = (index + 1) % self.models.len();
                        state.last_rate_limit = Some(Instant::now());
                    }
                    continue;
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Extraction attempt failed");
                    continue;
                }
            };

            match parse_loose_json(&content) {
                Some(value) => {
                    if let Ok(mut state) = self.state.lock() {
                        if state.last_rate_limit.is_some() {
                            state.cursor = (index + 1) % self.models.len();
                        }
                    }
                    return Some(value);
                }
                None => {
                    warn!(model = %model, "Model returned unparseable output");
                    continue;
                }
            }
        }

        warn!("All models exhausted for this extraction");
        None
    }

    /// One model attempt. JSON mode is requested first; if the provider
    /// rejects `response_format` the same model is retried without it.
    async fn attempt(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<String, ChatError> {
        let request = ChatRequest::new(model)
            .messages(messages.to_vec())
            .temperature(0.1)
            .json_mode();

        match self.api.chat_completion(request).await {
            Ok(response) => Ok(response.content),
            Err(e) if e.is_json_mode_rejection() => {
                debug!(model = %model, "JSON mode rejected, retrying plain");
                let request = ChatRequest::new(model)
                    .messages(messages.to_vec())
                    .temperature(0.1);
                self.api.chat_completion(request).await.map(|r| r.content)
            }
            Err(e) => Err(e),
        }
    }
}
