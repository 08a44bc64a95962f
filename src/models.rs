//! Data types flowing through the retrieval pipeline

use serde::{Deserialize, Serialize};

const PUBMED_ARTICLE_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";
const PMC_ARTICLE_URL: &str = "https://www.ncbi.nlm.nih.gov/pmc/articles";

/// Outcome of one ESearch call: the history session token and the UIDs to
/// fetch, in relevance order, already truncated to the caller's `top_k`
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// WebEnv session token scoping subsequent EFetch calls
    pub webenv: String,
    /// Article UIDs in relevance order
    pub uids: Vec<String>,
}

/// Full per-article detail, immutable once constructed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    /// PubMed UID
    pub uid: String,
    /// PMC identifier when the article is also hosted in PubMed Central
    pub pmc_id: Option<String>,
    /// Article or book-document title
    pub title: String,
    /// Flattened abstract text; may be empty
    pub summary: String,
    /// AMA-style formatted citation
    pub citation: String,
}

impl ArticleDetail {
    /// Canonical web address for this article: the PMC page when a PMC id
    /// exists, otherwise the PubMed article page keyed by UID
    pub fn article_url(&self) -> String {
        match &self.pmc_id {
            Some(pmc_id) => format!("{}/{}/", PMC_ARTICLE_URL, pmc_id),
            None => format!("{}/{}/", PUBMED_ARTICLE_URL, self.uid),
        }
    }
}

/// The externally visible result shape handed to the orchestration layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDoc {
    /// Canonical article page URL
    #[serde(rename = "URL")]
    pub url: String,
    /// Abstract text, guaranteed non-empty after trimming
    #[serde(rename = "Summary")]
    pub summary: String,
    /// AMA-style formatted citation
    #[serde(rename = "Citation")]
    pub citation: String,
}

/// Fold article details into result docs, dropping entries whose trimmed
/// summary is empty. Input order (search relevance order) is preserved.
pub fn assemble(details: Vec<ArticleDetail>) -> Vec<ResultDoc> {
    details
        .into_iter()
        .filter(|detail| !detail.summary.trim().is_empty())
        .map(|detail| {
            let url = detail.article_url();
            ResultDoc {
                url,
                summary: detail.summary,
                citation: detail.citation,
            }
        })
        .collect()
}

/// Render result docs as the plain-text block consumed by prompt templates.
///
/// Each doc becomes a `URL:`/`Summary:`/`Citation:` stanza with the summary
/// truncated to `max_summary_len` characters; an empty list renders as a
/// fixed no-result sentence so the downstream prompt always has content.
pub fn render_for_prompt(docs: &[ResultDoc], max_summary_len: usize) -> String {
    if docs.is_empty() {
        return "No good PubMed Result was found".to_string();
    }

    docs.iter()
        .map(|doc| {
            let summary: String = doc.summary.chars().take(max_summary_len).collect();
            format!(
                "URL: {}\nSummary:\n{}\nCitation:\n{}",
                doc.url, summary, doc.citation
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
