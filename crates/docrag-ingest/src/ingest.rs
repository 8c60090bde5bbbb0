//! Document ingestion pipeline: bytes → text → clean → chunk → index.

use tracing::{debug, info};

use crate::chunking::Chunker;
use crate::clean::clean_text;
use crate::file::{self, file_extension};
use docrag_core::{Error, RagConfig, Result};
use docrag_store::{ChunkMetadata, DocumentId, EmbeddingIndex};

/// Handles document ingestion: text extraction, cleaning, chunking, and indexing.
pub struct Ingester<'a> {
    index: &'a EmbeddingIndex,
    config: &'a RagConfig,
    chunker: Chunker,
}

impl<'a> Ingester<'a> {
    pub fn new(index: &'a EmbeddingIndex, config: &'a RagConfig) -> Result<Self> {
        Ok(Self {
            index,
            config,
            chunker: Chunker::from_config(config)?,
        })
    }

    /// Ingest an uploaded file under `document_id`.
    /// Returns the number of chunks indexed.
    pub fn ingest_file(
        &self,
        bytes: &[u8],
        filename: &str,
        document_id: DocumentId,
    ) -> Result<usize> {
        let accepted = file_extension(filename)
            .map(|ext| self.config.accepts_extension(&ext))
            .unwrap_or(false);
        if !accepted {
            return Err(Error::UnsupportedFormat(filename.to_string()));
        }

        let raw = file::extract_text(bytes, filename)?;
        let metadata = ChunkMetadata {
            filename: filename.to_string(),
            file_path: self
                .config
                .uploads_dir
                .join(filename)
                .to_string_lossy()
                .into_owned(),
            document_id,
        };
        self.ingest_text(&raw, &metadata)
    }

    /// Clean, chunk and index already-extracted text.
    pub fn ingest_text(&self, raw: &str, metadata: &ChunkMetadata) -> Result<usize> {
        let text = clean_text(raw);
        if text.is_empty() {
            debug!("No text left after cleaning {}", metadata.filename);
            return Ok(0);
        }

        let chunks = self.chunker.chunk(&text);
        debug!(
            "Split {} ({} chars) into {} chunks",
            metadata.filename,
            text.len(),
            chunks.len()
        );

        let count = self.index.insert(&chunks, metadata)?;
        info!(
            "Ingested document {} ({}) with {} chunks",
            metadata.document_id, metadata.filename, count
        );
        Ok(count)
    }
}
