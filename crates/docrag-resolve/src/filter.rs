//! Retrieval filter — narrows nearest-neighbor hits to the active document
//! and the query, then formats the survivors as context.
//!
//! Three stages run in order, each independently usable:
//! 1. document scope: keep hits from the active document only
//! 2. distance threshold: keep hits no farther than the threshold
//! 3. keyword overlap: keep hits containing at least one query keyword

use std::collections::HashSet;

use docrag_core::RagConfig;
use docrag_store::{DocumentId, ScoredChunk};
use tracing::debug;

use crate::types::FilterReport;

/// Keep only hits from `active`, or everything when no document is active.
pub fn scope_to_document(hits: Vec<ScoredChunk>, active: Option<DocumentId>) -> Vec<ScoredChunk> {
    match active {
        Some(id) => hits
            .into_iter()
            .filter(|h| h.chunk.document_id() == id)
            .collect(),
        None => hits,
    }
}

/// Keep hits whose distance is at most `threshold`.
pub fn within_threshold(hits: Vec<ScoredChunk>, threshold: f32) -> Vec<ScoredChunk> {
    hits.into_iter().filter(|h| h.score <= threshold).collect()
}

/// Lexical relevance check: does a chunk mention any word of the query?
///
/// Keywords are the lowercased whitespace-separated query tokens, matched
/// as substrings of the lowercased chunk text. Punctuation is kept, so
/// `"improve?"` only matches text containing `"improve?"`.
#[derive(Debug, Clone)]
pub struct KeywordOverlap {
    keywords: HashSet<String>,
}

impl KeywordOverlap {
    pub fn new(query: &str) -> Self {
        Self {
            keywords: query
                .to_lowercase()
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn keywords(&self) -> &HashSet<String> {
        &self.keywords
    }

    /// An empty query matches nothing.
    pub fn matches(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    pub fn retain(&self, hits: Vec<ScoredChunk>) -> Vec<ScoredChunk> {
        hits.into_iter()
            .filter(|h| self.matches(&h.chunk.text))
            .collect()
    }
}

/// Render hits as `From {filename}:\n{text}` blocks separated by a blank line.
pub fn format_context(hits: &[ScoredChunk]) -> String {
    hits.iter()
        .map(|h| format!("From {}:\n{}", h.chunk.metadata.filename, h.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The three filter stages with a fixed distance threshold.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalFilter {
    threshold: f32,
}

impl RetrievalFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(config.score_threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Run all stages, keeping the relative order of surviving hits.
    pub fn apply(
        &self,
        query: &str,
        hits: Vec<ScoredChunk>,
        active: Option<DocumentId>,
    ) -> (Vec<ScoredChunk>, FilterReport) {
        let candidates = hits.len();

        let scoped = scope_to_document(hits, active);
        let after_scope = scoped.len();

        let close = within_threshold(scoped, self.threshold);
        let after_threshold = close.len();

        let keywords = KeywordOverlap::new(query);
        let relevant = keywords.retain(close);

        let report = FilterReport {
            candidates,
            dropped_other_document: candidates - after_scope,
            dropped_over_threshold: after_scope - after_threshold,
            dropped_no_keyword: after_threshold - relevant.len(),
            kept: relevant.len(),
        };
        debug!(
            "Filtered {} hits for active document {:?}: {:?}",
            candidates, active, report
        );
        (relevant, report)
    }

    /// Filtered, formatted context; empty when nothing survives.
    pub fn filter_context(
        &self,
        query: &str,
        hits: Vec<ScoredChunk>,
        active: Option<DocumentId>,
    ) -> String {
        let (kept, _) = self.apply(query, hits, active);
        format_context(&kept)
    }
}
