//! Orchestrator — the ingest and answer entrypoints over one shared index.

use std::sync::Arc;

use docrag_core::{Error, RagConfig, Result};
use docrag_infer::EmbedderBackend;
use docrag_ingest::Ingester;
use docrag_resolve::RetrievalFilter;
use docrag_store::{DocumentId, EmbeddingIndex};
use tracing::{debug, info};

use crate::types::*;

/// Coordinates ingestion and query answering.
///
/// Holds no per-query state; every method takes `&self`, so one instance
/// can be shared across request handlers.
pub struct Orchestrator {
    config: RagConfig,
    index: Arc<EmbeddingIndex>,
    filter: RetrievalFilter,
}

impl Orchestrator {
    /// Create an orchestrator over an existing index. Validates `config`.
    pub fn new(config: RagConfig, index: Arc<EmbeddingIndex>) -> Result<Self> {
        config.validate()?;
        let filter = RetrievalFilter::from_config(&config);
        info!(
            "Orchestrator initialized: chunk_size={}, overlap={}, top_k={}, threshold={}",
            config.chunk_size, config.chunk_overlap, config.top_k, config.score_threshold
        );
        Ok(Self {
            config,
            index,
            filter,
        })
    }

    /// Create an orchestrator with a fresh index over `embedder`.
    pub fn with_embedder(config: RagConfig, embedder: Arc<dyn EmbedderBackend>) -> Result<Self> {
        Self::new(config, Arc::new(EmbeddingIndex::new(embedder)))
    }

    /// Create an orchestrator using the best available embedder.
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let embedder = docrag_infer::create_embedder(&config);
        Self::with_embedder(config, embedder)
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn index(&self) -> &Arc<EmbeddingIndex> {
        &self.index
    }

    /// Ingest an uploaded file: extract → clean → chunk → embed → index.
    ///
    /// Returns the number of chunks indexed.
    pub fn ingest(&self, bytes: &[u8], filename: &str, document_id: DocumentId) -> Result<usize> {
        Ingester::new(&self.index, &self.config)?.ingest_file(bytes, filename, document_id)
    }

    /// Resolve a query against the active document.
    ///
    /// "Nothing found" situations are outcomes, not errors.
    pub fn resolve(&self, query: &str, active: Option<DocumentId>) -> Result<QueryOutcome> {
        if !self.index.is_initialized() {
            debug!("Query before any document was indexed");
            return Ok(QueryOutcome::NoDocuments);
        }
        let Some(active) = active else {
            debug!("Query without an active document");
            return Ok(QueryOutcome::NoActiveDocument);
        };

        let hits = match self.index.search(query, self.config.top_k) {
            Ok(hits) => hits,
            Err(Error::EmptyIndex) => return Ok(QueryOutcome::NoDocuments),
            Err(e) => return Err(e),
        };
        debug!("Retrieved {} candidates for query {:?}", hits.len(), query);

        let (kept, report) = self.filter.apply(query, hits, Some(active));
        if kept.is_empty() {
            debug!("No relevant chunks in document {}", active);
            return Ok(QueryOutcome::NoRelevantInfo {
                query: query.to_string(),
            });
        }

        Ok(QueryOutcome::Context {
            context: docrag_resolve::format_context(&kept),
            report,
        })
    }

    /// Answer a query with response text.
    pub fn answer(&self, query: &str, active: Option<DocumentId>) -> Result<String> {
        Ok(self
            .resolve(query, active)?
            .render(self.config.max_response_chars))
    }

    /// Remove a deleted document's chunks from the index.
    pub fn forget_document(&self, document_id: DocumentId) -> usize {
        self.index.remove_by_document_id(document_id)
    }

    /// Get runtime status.
    pub fn status(&self) -> RuntimeStatus {
        RuntimeStatus {
            index: self.index.stats(),
            embedder: self.index.embedder().name().to_string(),
            top_k: self.config.top_k,
            score_threshold: self.config.score_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrag_infer::HashEmbedder;

    const SAMPLE: &[u8] = b"Practice makes perfect. Hard work leads to success.";

    fn orchestrator(config: RagConfig) -> Orchestrator {
        Orchestrator::with_embedder(config, Arc::new(HashEmbedder::new(384))).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RagConfig {
            chunk_size: 10,
            chunk_overlap: 20,
            ..Default::default()
        };
        let result = Orchestrator::with_embedder(config, Arc::new(HashEmbedder::new(8)));
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_no_documents_for_any_query() {
        let orch = orchestrator(RagConfig::default());
        for query in ["success", "", "How can I improve?"] {
            assert_eq!(orch.answer(query, Some(1)).unwrap(), NO_DOCUMENTS_MESSAGE);
            assert_eq!(orch.answer(query, None).unwrap(), NO_DOCUMENTS_MESSAGE);
        }
    }

    #[test]
    fn test_no_active_document() {
        let orch = orchestrator(RagConfig::default());
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();
        assert_eq!(
            orch.answer("success", None).unwrap(),
            NO_ACTIVE_DOCUMENT_MESSAGE
        );
    }

    #[test]
    fn test_context_response() {
        // The hash embedder is lexical, so allow any distance here and let
        // the keyword stage decide.
        let orch = orchestrator(RagConfig {
            score_threshold: 4.0,
            ..Default::default()
        });
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();

        let outcome = orch.resolve("success", Some(1)).unwrap();
        assert!(outcome.has_context());
        let answer = outcome.to_string();
        assert!(answer.starts_with(CONTEXT_PREFIX));
        assert!(answer.contains("From sample.txt:\nPractice makes perfect. Hard work leads to success."));
    }

    #[test]
    fn test_response_truncation() {
        let orch = orchestrator(RagConfig {
            score_threshold: 4.0,
            max_response_chars: Some(10),
            ..Default::default()
        });
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();
        let answer = orch.answer("success", Some(1)).unwrap();
        assert_eq!(answer, format!("{CONTEXT_PREFIX}From sampl"));
    }

    #[test]
    fn test_other_active_document() {
        let orch = orchestrator(RagConfig {
            score_threshold: 4.0,
            ..Default::default()
        });
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();
        let outcome = orch.resolve("success", Some(2)).unwrap();
        assert_eq!(
            outcome,
            QueryOutcome::NoRelevantInfo {
                query: "success".into()
            }
        );
    }

    #[test]
    fn test_forget_document() {
        let orch = orchestrator(RagConfig {
            score_threshold: 4.0,
            ..Default::default()
        });
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();
        assert_eq!(orch.forget_document(1), 1);
        assert_eq!(orch.answer("success", Some(1)).unwrap(), NO_DOCUMENTS_MESSAGE);
    }

    #[test]
    fn test_ingest_errors_propagate() {
        let orch = orchestrator(RagConfig::default());
        assert!(matches!(
            orch.ingest(b"x", "image.png", 1),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            orch.ingest(b"not a pdf", "broken.pdf", 1),
            Err(Error::Extraction(_))
        ));
        assert_eq!(orch.answer("x", Some(1)).unwrap(), NO_DOCUMENTS_MESSAGE);
    }

    #[test]
    fn test_status() {
        let orch = orchestrator(RagConfig::default());
        orch.ingest(SAMPLE, "sample.txt", 1).unwrap();
        let status = orch.status();
        assert_eq!(status.embedder, "hash");
        assert_eq!(status.top_k, 3);
        assert_eq!(status.index.entries, 1);
        assert_eq!(status.index.documents, 1);
    }
}
