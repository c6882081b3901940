use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    /// Model failover order for the extraction gateway.
    pub llm_models: Vec<String>,
    /// How long a finished session's event channel stays subscribable.
    pub stream_grace: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let llm_models = match env::var("LLM_MODELS") {
            Ok(raw) => raw
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            Err(_) => crawler::default_models(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            llm_api_key: env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?,
            llm_base_url: env::var("LLM_BASE_URL").ok(),
            llm_models,
            stream_grace: Duration::from_secs(
                env::var("STREAM_GRACE_SECONDS")
                    .unwrap_or_else(|_| "60".to_string())
                    .parse()
                    .context("STREAM_GRACE_SECONDS must be a valid number")?,
            ),
        })
    }
}
