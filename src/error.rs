use std::result;

use crate::retry::RetryableError;
use thiserror::Error;

/// Error types for PubMed retrieval operations
#[derive(Error, Debug)]
pub enum RetrieverError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML parsing error with detailed message
    #[error("XML parsing error: {message}")]
    XmlParseError { message: String },

    /// Article record not found in the EFetch response
    #[error("Article not found: UID {uid}")]
    ArticleNotFound { uid: String },

    /// No formatted citation available for this UID
    #[error("Citation not available for UID {uid}")]
    CitationNotAvailable { uid: String },

    /// ESearch response did not include a history session token
    #[error("History session (WebEnv) not returned by search")]
    WebEnvNotAvailable,

    /// API rate limit signal (HTTP 429)
    #[error("API rate limit exceeded")]
    RateLimitExceeded,

    /// Generic API error with HTTP status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
}

pub type Result<T> = result::Result<T, RetrieverError>;

impl RetryableError for RetrieverError {
    fn is_retryable(&self) -> bool {
        // Only the rate-limit signal is retried; every other transport or
        // decode failure surfaces to the caller immediately.
        matches!(self, RetrieverError::RateLimitExceeded)
    }

    fn retry_reason(&self) -> &str {
        match self {
            RetrieverError::RateLimitExceeded => "Rate limit exceeded",
            RetrieverError::RequestError(_) => "Network error",
            RetrieverError::JsonError(_) => "Invalid JSON response",
            RetrieverError::XmlParseError { .. } => "Invalid XML response",
            RetrieverError::ArticleNotFound { .. } => "Article does not exist",
            RetrieverError::CitationNotAvailable { .. } => "Citation not available",
            RetrieverError::WebEnvNotAvailable => "History session missing",
            RetrieverError::ApiError { .. } => "API error",
        }
    }
}
