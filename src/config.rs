//! Client configuration for NCBI endpoints, credentials, and retry policy

use std::time::Duration;

use crate::rate_limit::RateLimiter;
use crate::retry::RetryConfig;

const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DEFAULT_CITATION_BASE_URL: &str = "https://api.ncbi.nlm.nih.gov/lit/ctxp/v1/pubmed/";

/// Configuration for [`PubMedRetriever`](crate::PubMedRetriever)
///
/// Carries the endpoint base URLs (overridable for testing), optional NCBI
/// API credentials, the request rate limit, and the 429 backoff policy.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Option<String>,
    citation_base_url: Option<String>,
    api_key: Option<String>,
    email: Option<String>,
    tool: Option<String>,
    rate_limit: Option<f64>,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
    /// Backoff policy applied to rate-limited article fetches
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: None,
            citation_base_url: None,
            api_key: None,
            email: None,
            tool: None,
            rate_limit: None,
            timeout: Duration::from_secs(30),
            retry: RetryConfig::new(),
        }
    }

    /// Override the E-utilities base URL (ESearch/EFetch)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Override the Literature Citation Exporter base URL
    pub fn with_citation_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.citation_base_url = Some(base_url.into());
        self
    }

    /// Set an NCBI API key (raises the allowed request rate to 10/s)
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the contact email sent with E-utilities requests
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the tool name sent with E-utilities requests
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Override the request rate limit (requests per second)
    pub fn with_rate_limit(mut self, rate: f64) -> Self {
        self.rate_limit = Some(rate);
        self
    }

    /// Set the per-request HTTP timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the 429 backoff policy
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_EUTILS_BASE_URL)
    }

    pub fn effective_citation_base_url(&self) -> &str {
        self.citation_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CITATION_BASE_URL)
    }

    /// Requests per second: explicit override, else NCBI defaults
    /// (10/s with an API key, 3/s without)
    pub fn effective_rate_limit(&self) -> f64 {
        match (self.rate_limit, &self.api_key) {
            (Some(rate), _) => rate,
            (None, Some(_)) => 10.0,
            (None, None) => 3.0,
        }
    }

    pub fn effective_user_agent(&self) -> String {
        format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        )
    }

    pub fn create_rate_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.effective_rate_limit())
    }

    /// Extra query parameters appended to every E-utilities request
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(api_key) = &self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(email) = &self.email {
            params.push(("email".to_string(), email.clone()));
        }
        if let Some(tool) = &self.tool {
            params.push(("tool".to_string(), tool.clone()));
        }
        params
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
