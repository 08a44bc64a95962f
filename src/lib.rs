//! # pubmed-retriever
//!
//! Async literature retrieval from PubMed for reference lookup in
//! problem-based-learning (PBL) medical education pipelines.
//!
//! One call drives the whole pipeline: a relevance-ordered ESearch, a
//! per-identifier EFetch with exponential backoff on rate limiting, XML
//! parsing across the journal-article and book-document record shapes, a
//! formatted-citation lookup, and assembly of `{URL, Summary, Citation}`
//! documents ready to be folded into downstream prompts.
//!
//! ## Quick start
//!
//! ```no_run
//! use pubmed_retriever::PubMedRetriever;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let retriever = PubMedRetriever::new();
//!     let docs = retriever.run("fever AND influenza", 3).await?;
//!
//!     for doc in &docs {
//!         println!("{}", doc.url);
//!         println!("{}", doc.citation);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Failed identifiers are skipped rather than aborting the batch, so a run
//! can legitimately return fewer documents than requested, or none at all.

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod parser;
pub mod rate_limit;
pub mod retry;

mod responses;

// Re-export the main types for convenience
pub use client::PubMedRetriever;
pub use config::ClientConfig;
pub use error::{Result, RetrieverError};
pub use models::{assemble, render_for_prompt, ArticleDetail, ResultDoc, SearchOutcome};
pub use parser::{parse_article, ParsedArticle};
pub use retry::RetryConfig;
