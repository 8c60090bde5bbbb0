//! Data types for chunks, index entries, and search results.

use serde::{Deserialize, Serialize};

/// Identifier of a document record owned by the external metadata store.
pub type DocumentId = i64;

/// A flat text chunk with position metadata, as produced by the chunker.
///
/// Positions are character offsets into the cleaned source text; `char_end`
/// is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    pub text: String,
    pub chunk_index: usize,
    pub char_start: usize,
    pub char_end: usize,
}

impl TextChunk {
    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// Source information attached to every chunk of one ingested file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub file_path: String,
    pub document_id: DocumentId,
}

/// An indexed chunk: text, position, and source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub chunk_index: usize,
    pub char_start: usize,
    pub char_end: usize,
    pub metadata: ChunkMetadata,
}

impl Chunk {
    pub fn new(chunk: &TextChunk, metadata: &ChunkMetadata) -> Self {
        Self {
            text: chunk.text.clone(),
            chunk_index: chunk.chunk_index,
            char_start: chunk.char_start,
            char_end: chunk.char_end,
            metadata: metadata.clone(),
        }
    }

    pub fn document_id(&self) -> DocumentId {
        self.metadata.document_id
    }
}

/// A chunk held by the index. Its embedding is the matching row of the
/// index matrix.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    /// Unix timestamp (seconds) of insertion.
    pub indexed_at: i64,
}

/// A search hit. `score` is a squared Euclidean distance between unit
/// vectors, in `[0, 4]`; smaller is more similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Index-level statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub initialized: bool,
    pub entries: usize,
    pub documents: usize,
    pub dimension: usize,
}
