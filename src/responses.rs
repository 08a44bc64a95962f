//! JSON response shapes for the ESearch and Literature Citation Exporter APIs

use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Deserialize)]
pub(crate) struct ESearchResult {
    pub esearchresult: ESearchData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ESearchData {
    #[serde(default, rename = "ERROR")]
    pub error: Option<String>,
    #[serde(default)]
    pub count: Option<String>,
    #[serde(default)]
    pub idlist: Vec<String>,
    /// WebEnv session identifier for the history server
    #[serde(default)]
    pub webenv: Option<String>,
}

/// Citation Exporter response: one formatted citation per style
/// (`ama`, `mla`, `apa`, ...), each with the original and HTML forms
#[derive(Debug, Deserialize)]
pub(crate) struct CitationResponse {
    #[serde(flatten)]
    pub styles: HashMap<String, CitationFormat>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CitationFormat {
    pub orig: Option<String>,
}

impl CitationResponse {
    /// The original-form citation for one style, e.g. `"ama"`
    pub fn original(&self, style: &str) -> Option<&str> {
        self.styles
            .get(style)
            .and_then(|format| format.orig.as_deref())
    }
}
