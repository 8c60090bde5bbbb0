//! Runtime types.

use std::fmt;

use serde::Serialize;

use docrag_resolve::FilterReport;
use docrag_store::IndexStats;

/// Response when nothing has ever been indexed.
pub const NO_DOCUMENTS_MESSAGE: &str =
    "No documents have been uploaded or processed. Please upload a .txt or .pdf file.";

/// Response when the caller did not supply an active document.
pub const NO_ACTIVE_DOCUMENT_MESSAGE: &str =
    "No active file selected. Please select a file to query.";

/// Prefix of a response carrying retrieved context.
pub const CONTEXT_PREFIX: &str = "Based on the retrieved context:\n";

/// Terminal outcome of one query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The index has never been populated.
    NoDocuments,
    /// No active document id was supplied.
    NoActiveDocument,
    /// Every retrieved chunk was filtered out.
    NoRelevantInfo { query: String },
    /// Filtered chunks, formatted as context.
    Context { context: String, report: FilterReport },
}

impl QueryOutcome {
    /// Whether retrieved context is being returned.
    pub fn has_context(&self) -> bool {
        matches!(self, Self::Context { .. })
    }

    /// Response text, with context truncated to `max_chars` characters if set.
    pub fn render(&self, max_chars: Option<usize>) -> String {
        match self {
            Self::NoDocuments => NO_DOCUMENTS_MESSAGE.to_string(),
            Self::NoActiveDocument => NO_ACTIVE_DOCUMENT_MESSAGE.to_string(),
            Self::NoRelevantInfo { query } => {
                format!("No relevant information found in the active document for query: {query}")
            }
            Self::Context { context, .. } => match max_chars {
                Some(max) => format!(
                    "{CONTEXT_PREFIX}{}",
                    context.chars().take(max).collect::<String>()
                ),
                None => format!("{CONTEXT_PREFIX}{context}"),
            },
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

/// Runtime status information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeStatus {
    pub index: IndexStats,
    pub embedder: String,
    pub top_k: usize,
    pub score_threshold: f32,
}
