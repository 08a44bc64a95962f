//! EFetch XML parsing
//!
//! EFetch returns one of two top-level record shapes: a journal article
//! (`PubmedArticle`) or a book document (`PubmedBookArticle`). Both are
//! decoded up front and the variant is selected by a discriminant check on
//! the decoded structure rather than by error-driven fallback. Abstract text
//! likewise arrives in three shapes (plain string, one structured block, a
//! sequence of labelled blocks), classified into an explicit sum type before
//! flattening.

use quick_xml::de::from_str;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{Result, RetrieverError};

/// Article fields extracted from EFetch XML, before the citation is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArticle {
    pub uid: String,
    pub pmc_id: Option<String>,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename = "PubmedArticleSet")]
struct PubmedArticleSet {
    #[serde(rename = "PubmedArticle")]
    article: Option<PubmedArticleXml>,
    #[serde(rename = "PubmedBookArticle")]
    book_article: Option<PubmedBookArticleXml>,
}

#[derive(Debug, Deserialize)]
struct PubmedArticleXml {
    #[serde(rename = "MedlineCitation")]
    medline_citation: MedlineCitation,
    #[serde(rename = "PubmedData")]
    pubmed_data: Option<PubmedData>,
}

#[derive(Debug, Deserialize)]
struct MedlineCitation {
    #[serde(rename = "Article")]
    article: ArticleXml,
}

#[derive(Debug, Deserialize)]
struct ArticleXml {
    #[serde(rename = "ArticleTitle")]
    title: Option<TextElement>,
    #[serde(rename = "Abstract")]
    abstract_section: Option<AbstractSection>,
}

#[derive(Debug, Deserialize)]
struct PubmedBookArticleXml {
    #[serde(rename = "BookDocument")]
    book_document: BookDocumentXml,
}

#[derive(Debug, Deserialize)]
struct BookDocumentXml {
    #[serde(rename = "ArticleTitle")]
    title: Option<TextElement>,
    #[serde(rename = "Abstract")]
    abstract_section: Option<AbstractSection>,
}

#[derive(Debug, Deserialize)]
struct PubmedData {
    #[serde(rename = "ArticleIdList")]
    article_id_list: Option<ArticleIdList>,
}

#[derive(Debug, Deserialize)]
struct ArticleIdList {
    #[serde(rename = "ArticleId", default)]
    ids: Vec<ArticleId>,
}

#[derive(Debug, Deserialize)]
struct ArticleId {
    #[serde(rename = "@IdType")]
    id_type: Option<String>,
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// Element whose only interesting content is its text (e.g. `ArticleTitle`,
/// which may carry presentation attributes)
#[derive(Debug, Deserialize)]
struct TextElement {
    #[serde(rename = "$text")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AbstractSection {
    #[serde(rename = "AbstractText", default)]
    texts: Vec<AbstractBlock>,
}

/// One `AbstractText` element; `Label` and `NlmCategory` mark structured
/// abstract sections
#[derive(Debug, Deserialize)]
struct AbstractBlock {
    #[serde(rename = "$text")]
    text: Option<String>,
    #[serde(rename = "@Label")]
    label: Option<String>,
    #[serde(rename = "@NlmCategory")]
    nlm_category: Option<String>,
}

impl AbstractBlock {
    /// `"CATEGORY: "` then `"Label: "`, either part optional
    fn prefix(&self) -> String {
        let mut prefix = String::new();
        if let Some(category) = &self.nlm_category {
            prefix.push_str(category);
            prefix.push_str(": ");
        }
        if let Some(label) = &self.label {
            prefix.push_str(label);
            prefix.push_str(": ");
        }
        prefix
    }
}

/// The shapes an abstract can take on the wire
enum AbstractShape<'a> {
    Absent,
    /// A bare string with no section metadata, used as-is
    Plain(&'a AbstractBlock),
    /// One structured block: its text only, no section prefix
    SingleBlock(&'a AbstractBlock),
    /// A sequence of blocks, each prefixed with its section metadata
    Sequence(&'a [AbstractBlock]),
}

fn classify_abstract(texts: &[AbstractBlock]) -> AbstractShape<'_> {
    match texts {
        [] => AbstractShape::Absent,
        [one] if one.label.is_none() && one.nlm_category.is_none() => AbstractShape::Plain(one),
        [one] => AbstractShape::SingleBlock(one),
        many => AbstractShape::Sequence(many),
    }
}

/// Flatten abstract blocks into a single summary string.
///
/// A lone block contributes its text only; a sequence gets per-block section
/// prefixes joined by newlines. Blocks without text are dropped.
fn flatten_abstract(texts: &[AbstractBlock]) -> String {
    match classify_abstract(texts) {
        AbstractShape::Absent => String::new(),
        AbstractShape::Plain(block) | AbstractShape::SingleBlock(block) => {
            block.text.clone().unwrap_or_default()
        }
        AbstractShape::Sequence(blocks) => blocks
            .iter()
            .filter_map(|block| {
                block
                    .text
                    .as_ref()
                    .map(|text| format!("{}{}", block.prefix(), text))
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// First ArticleId tagged as a PMC identifier, if any.
/// Absence at any level means "not hosted in PMC", never a parse failure.
fn extract_pmc_id(pubmed_data: Option<&PubmedData>) -> Option<String> {
    pubmed_data
        .and_then(|data| data.article_id_list.as_ref())
        .and_then(|list| {
            list.ids
                .iter()
                .find(|id| id.id_type.as_deref() == Some("pmc"))
                .and_then(|id| id.value.clone())
        })
}

/// Parse one EFetch response into a [`ParsedArticle`].
///
/// Fails with [`RetrieverError::XmlParseError`] when the document is not
/// well-formed or carries neither record shape, and with
/// [`RetrieverError::ArticleNotFound`] when the record has no title. Callers
/// treat any error here as "skip this identifier".
#[instrument(skip(xml), fields(uid = %uid, xml_size = xml.len()))]
pub fn parse_article(uid: &str, xml: &str) -> Result<ParsedArticle> {
    let record: PubmedArticleSet = from_str(xml).map_err(|e| RetrieverError::XmlParseError {
        message: format!("Failed to deserialize EFetch XML: {}", e),
    })?;

    let (title, abstract_section, pubmed_data) = match (record.article, record.book_article) {
        (Some(article), _) => {
            let inner = article.medline_citation.article;
            (inner.title, inner.abstract_section, article.pubmed_data)
        }
        (None, Some(book)) => {
            let inner = book.book_document;
            (inner.title, inner.abstract_section, None)
        }
        (None, None) => {
            return Err(RetrieverError::XmlParseError {
                message: format!(
                    "UID {}: neither PubmedArticle nor PubmedBookArticle present",
                    uid
                ),
            })
        }
    };

    let title = title
        .and_then(|element| element.text)
        .ok_or_else(|| RetrieverError::ArticleNotFound {
            uid: uid.to_string(),
        })?;

    let summary = abstract_section
        .map(|section| flatten_abstract(&section.texts))
        .unwrap_or_default();

    let pmc_id = extract_pmc_id(pubmed_data.as_ref());

    debug!(
        has_summary = !summary.is_empty(),
        has_pmc_id = pmc_id.is_some(),
        "Parsed article record"
    );

    Ok(ParsedArticle {
        uid: uid.to_string(),
        pmc_id,
        title,
        summary,
    })
}
