//! Page fetcher: one HTTP GET with a fixed timeout and browser-like headers.
//!
//! 403 and 429 are hard failures at this layer; retry policy, if any,
//! lives in the callers. There is no cookie jar and no crawl-level retry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use thiserror::Error;

/// Fetch timeout. Slow university servers get this long and no more.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out fetching {url}")]
    Timeout { url: String },

    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Blocked { status: u16, url: String },
}

/// Trait for page fetching (to allow mocking).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Real fetcher over reqwest.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        // Browser-like identity: plenty of faculty pages serve bots a 403.
        let user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                .parse()
                .expect("static header value"),
        );
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            "en-US,en;q=0.5".parse().expect("static header value"),
        );

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        // Bot walls and throttling. Other statuses still carry usable markup
        // (custom 404 pages on directory sites often list real links).
        if status == 403 || status == 429 {
            return Err(FetchError::Blocked {
                status,
                url: url.to_string(),
            });
        }

        response.text().await.map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory fetcher keyed by URL, recording the fetch order.
    pub struct MapFetcher {
        pages: HashMap<String, String>,
        blocked: HashMap<String, u16>,
        log: Mutex<Vec<String>>,
    }

    impl MapFetcher {
        pub fn new<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(url, html)| (url.to_string(), html.to_string()))
                    .collect(),
                blocked: HashMap::new(),
                log: Mutex::new(Vec::new()),
            }
        }

        /// Make a URL answer with an access-blocked status.
        pub fn blocking(mut self, url: &str, status: u16) -> Self {
            self.blocked.insert(url.to_string(), status);
            self
        }

        /// URLs fetched so far, in order.
        pub fn fetched(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.log.lock().unwrap().push(url.to_string());
            if let Some(status) = self.blocked.get(url) {
                return Err(FetchError::Blocked {
                    status: *status,
                    url: url.to_string(),
                });
            }
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::Network {
                    url: url.to_string(),
                    message: "no such page".to_string(),
                })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Blocked {
            status: 429,
            url: "https://example.edu/faculty".into(),
        };
        assert_eq!(err.to_string(), "HTTP 429 for https://example.edu/faculty");
    }
}
