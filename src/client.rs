//! PubMed retrieval client
//!
//! One client drives the whole pipeline: ESearch with the history server for
//! a relevance-ordered UID list, then per UID an EFetch (with 429 backoff),
//! XML parse, and citation fetch, strictly sequentially. Per-identifier
//! failures are logged and skipped; only a failed search aborts a run.

use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Result, RetrieverError};
use crate::models::{assemble, ArticleDetail, ResultDoc, SearchOutcome};
use crate::parser::parse_article;
use crate::rate_limit::RateLimiter;
use crate::responses::{CitationResponse, ESearchResult};
use crate::retry::with_retry;

/// Maximum usable query length; longer queries are truncated before transport
const MAX_QUERY_LENGTH: usize = 128;

/// Identifiers requested from ESearch, independent of the caller's `top_k`
const ESEARCH_RETMAX: usize = 1000;

/// Citation style extracted from the Citation Exporter response
const CITATION_STYLE: &str = "ama";

/// Characters passed through unencoded in the search term, so PubMed
/// advanced-search syntax (field tags, boolean operators, `+` separators)
/// survives transport
const TERM_SAFE_CHARS: &str = ":/?=&\"[]+";

/// Client for retrieving literature references from PubMed
#[derive(Clone)]
pub struct PubMedRetriever {
    client: Client,
    base_url: String,
    citation_base_url: String,
    rate_limiter: RateLimiter,
    config: ClientConfig,
}

impl PubMedRetriever {
    /// Create a retriever with default configuration (no API key, 3 req/s)
    pub fn new() -> Self {
        Self::with_config(ClientConfig::new())
    }

    /// Create a retriever with custom configuration
    ///
    /// # Example
    ///
    /// ```
    /// use pubmed_retriever::{ClientConfig, PubMedRetriever};
    ///
    /// let config = ClientConfig::new()
    ///     .with_api_key("your_api_key_here")
    ///     .with_email("intern@hospital.example");
    /// let retriever = PubMedRetriever::with_config(config);
    /// ```
    pub fn with_config(config: ClientConfig) -> Self {
        let rate_limiter = config.create_rate_limiter();
        let base_url = config.effective_base_url().to_string();
        let citation_base_url = config.effective_citation_base_url().to_string();

        let client = Client::builder()
            .user_agent(config.effective_user_agent())
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            citation_base_url,
            rate_limiter,
            config,
        }
    }

    /// Search PubMed and retrieve the top-k supporting documents.
    ///
    /// This is the single entry point used by the PBL orchestration layer.
    /// Identifiers whose fetch, parse, or citation lookup fails are skipped;
    /// documents without abstract text are filtered out. An empty result list
    /// means "no results found", not an error.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use pubmed_retriever::PubMedRetriever;
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let retriever = PubMedRetriever::new();
    ///     let docs = retriever.run("fever AND influenza", 3).await?;
    ///     for doc in docs {
    ///         println!("{}", doc.url);
    ///     }
    ///     Ok(())
    /// }
    /// ```
    #[instrument(skip(self), fields(query = %query, top_k = top_k))]
    pub async fn run(&self, query: &str, top_k: usize) -> Result<Vec<ResultDoc>> {
        let outcome = self.search(query, top_k).await?;
        let total = outcome.uids.len();
        let mut details = Vec::with_capacity(total);

        for (index, uid) in outcome.uids.iter().enumerate() {
            info!(
                uid = %uid,
                position = index + 1,
                total = total,
                "Retrieving article"
            );
            match self.fetch_article(uid, &outcome.webenv).await {
                Ok(detail) => details.push(detail),
                Err(err) => {
                    warn!(uid = %uid, error = %err, "Skipping identifier");
                }
            }
        }

        let docs = assemble(details);
        info!(requested = total, returned = docs.len(), "Run completed");
        Ok(docs)
    }

    /// Search for articles matching the query, in relevance order.
    ///
    /// Performs one ESearch request with `usehistory=y`; the returned WebEnv
    /// token scopes all subsequent fetches of this run. The UID list is
    /// truncated to `top_k`. A response without a session token or an
    /// API-level error is a hard failure; this layer never retries.
    #[instrument(skip(self), fields(query = %query, top_k = top_k))]
    pub async fn search(&self, query: &str, top_k: usize) -> Result<SearchOutcome> {
        let term = prepare_term(query);
        let url = format!(
            "{}/esearch.fcgi?db=pubmed&term={}&retmode=json&retmax={}&usehistory=y&sort=relevance",
            self.base_url,
            encode_term(&term),
            ESEARCH_RETMAX,
        );

        debug!("Making ESearch API request");
        let response = self.get_checked(&self.with_api_params(&url)).await?;
        let search_result: ESearchResult = serde_json::from_slice(&response.bytes().await?)?;

        // NCBI sometimes returns 200 OK with an ERROR field in the body
        if let Some(error_msg) = &search_result.esearchresult.error {
            return Err(RetrieverError::ApiError {
                status: 200,
                message: format!("NCBI ESearch API error: {}", error_msg),
            });
        }

        let webenv = search_result
            .esearchresult
            .webenv
            .ok_or(RetrieverError::WebEnvNotAvailable)?;

        let mut uids = search_result.esearchresult.idlist;
        uids.truncate(top_k);

        info!(
            total_count = ?search_result.esearchresult.count,
            returned = uids.len(),
            "Search completed"
        );

        Ok(SearchOutcome { webenv, uids })
    }

    /// Fetch, parse, and cite one article within a search session.
    ///
    /// The EFetch request retries on HTTP 429 per the configured backoff
    /// policy; any other failure (transport, parse, citation) surfaces
    /// immediately so the caller can skip this identifier.
    #[instrument(skip(self, webenv), fields(uid = %uid))]
    pub async fn fetch_article(&self, uid: &str, webenv: &str) -> Result<ArticleDetail> {
        let xml = self.fetch_article_xml(uid, webenv).await?;
        let parsed = parse_article(uid, &xml)?;
        let citation = self.fetch_citation(uid).await?;

        Ok(ArticleDetail {
            uid: parsed.uid,
            pmc_id: parsed.pmc_id,
            title: parsed.title,
            summary: parsed.summary,
            citation,
        })
    }

    /// Fetch the AMA-style formatted citation for one UID.
    #[instrument(skip(self), fields(uid = %uid))]
    pub async fn fetch_citation(&self, uid: &str) -> Result<String> {
        let url = format!(
            "{}?format=citation&id={}",
            self.citation_base_url,
            urlencoding::encode(uid),
        );

        debug!("Making citation API request");
        let response = self.get_checked(&url).await?;
        let citations: CitationResponse = serde_json::from_slice(&response.bytes().await?)?;

        citations
            .original(CITATION_STYLE)
            .map(str::to_string)
            .ok_or_else(|| RetrieverError::CitationNotAvailable {
                uid: uid.to_string(),
            })
    }

    /// EFetch the raw article XML, retrying on the rate-limit signal
    async fn fetch_article_xml(&self, uid: &str, webenv: &str) -> Result<String> {
        let url = format!(
            "{}/efetch.fcgi?db=pubmed&retmode=xml&id={}&webenv={}",
            self.base_url,
            urlencoding::encode(uid),
            urlencoding::encode(webenv),
        );
        let url = self.with_api_params(&url);

        let response = with_retry(
            || async {
                self.rate_limiter.acquire().await;
                debug!(url = %url, "Making EFetch API request");
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(RetrieverError::from)?;

                if response.status().as_u16() == 429 {
                    return Err(RetrieverError::RateLimitExceeded);
                }

                Ok(response)
            },
            &self.config.retry,
            "EFetch request",
        )
        .await?;

        let response = check_status(response)?;
        Ok(response.text().await?)
    }

    /// Rate-limited GET that fails on any non-success status, without retry
    async fn get_checked(&self, url: &str) -> Result<Response> {
        self.rate_limiter.acquire().await;
        debug!(url = %url, "Making API request");
        let response = self.client.get(url).send().await?;
        check_status(response)
    }

    /// Append configured API parameters (api_key, email, tool) to a URL
    fn with_api_params(&self, url: &str) -> String {
        let api_params = self.config.build_api_params();
        if api_params.is_empty() {
            return url.to_string();
        }

        let mut final_url = url.to_string();
        final_url.push(if url.contains('?') { '&' } else { '?' });
        let param_strings: Vec<String> = api_params
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
            .collect();
        final_url.push_str(&param_strings.join("&"));
        final_url
    }
}

impl Default for PubMedRetriever {
    fn default() -> Self {
        Self::new()
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        warn!(status = status.as_u16(), "API request failed");
        Err(RetrieverError::ApiError {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
        })
    }
}

/// Collapse whitespace runs to `+` and truncate to the usable query length
fn prepare_term(query: &str) -> String {
    let collapsed = query.split_whitespace().collect::<Vec<_>>().join("+");
    collapsed.chars().take(MAX_QUERY_LENGTH).collect()
}

/// Percent-encode a search term, leaving PubMed query syntax intact
fn encode_term(term: &str) -> String {
    term.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric()
                || "-_.~".contains(c)
                || TERM_SAFE_CHARS.contains(c)
            {
                c.to_string()
            } else {
                urlencoding::encode(&c.to_string()).into_owned()
            }
        })
        .collect()
}
