//! Error types for the chat completion client.

use thiserror::Error;

/// Result type for chat client operations.
pub type Result<T> = std::result::Result<T, ChatError>;

/// Chat client errors.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The provider rejected the request for rate-limit reasons (HTTP 429
    /// or a rate-limit error body)
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// API error (non-2xx response, invalid request)
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ChatError {
    /// True if the provider refused the request because it does not support
    /// JSON-mode output. Callers retry the same model without `response_format`.
    pub fn is_json_mode_rejection(&self) -> bool {
        match self {
            ChatError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("response_format") || lower.contains("json")
            }
            _ => false,
        }
    }

    /// True if this error should trigger model rotation with a cooldown.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ChatError::RateLimited(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_mode_rejection_detection() {
        let err = ChatError::Api {
            status: 400,
            message: "'response_format' is not supported with this model".into(),
        };
        assert!(err.is_json_mode_rejection());

        let err = ChatError::Api {
            status: 400,
            message: "json_object mode unavailable".into(),
        };
        assert!(err.is_json_mode_rejection());

        let err = ChatError::Api {
            status: 500,
            message: "internal server error".into(),
        };
        assert!(!err.is_json_mode_rejection());

        assert!(!ChatError::RateLimited("429".into()).is_json_mode_rejection());
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(ChatError::RateLimited("too many requests".into()).is_rate_limit());
        assert!(!ChatError::Network("timeout".into()).is_rate_limit());
    }
}
