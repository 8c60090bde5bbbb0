//! Embedding engine trait and the offline hashing backend.
//!
//! The `EmbedderBackend` trait abstracts over embedding generation.
//! Implementations:
//! - `HashEmbedder`: hashed bag-of-words vectors, no model files required
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires the `onnx` feature)
//! - `CachedEmbedder`: wraps any backend with a query cache

use ndarray::Array1;
use sha2::{Digest, Sha256};

use docrag_core::Result;

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// Float32 embedding vector. Not necessarily unit length.
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

impl EmbeddingResult {
    pub fn fresh(embedding: Array1<f32>) -> Self {
        Self {
            embedding,
            cached: false,
        }
    }
}

/// Trait for embedding backends.
///
/// The same backend must embed both indexed chunks and queries, otherwise
/// distances are meaningless.
pub trait EmbedderBackend: Send + Sync {
    /// Generate an embedding for a text string.
    fn embed(&self, text: &str) -> Result<EmbeddingResult>;

    /// Generate embeddings for a batch of texts, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Short backend name for logs.
    fn name(&self) -> &str;
}

/// Deterministic hashed bag-of-words embedder.
///
/// Each lowercase alphanumeric token is hashed into one of `dim` buckets with
/// a hash-derived sign. Texts sharing vocabulary land close together; there is
/// no notion of synonymy.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let mut idx_bytes = [0u8; 8];
        idx_bytes.copy_from_slice(&digest[..8]);
        let idx = (u64::from_le_bytes(idx_bytes) % self.dim as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        (idx, sign)
    }
}

impl EmbedderBackend for HashEmbedder {
    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        let mut embedding = Array1::<f32>::zeros(self.dim);
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let (idx, sign) = self.bucket(token);
            embedding[idx] += sign;
        }
        Ok(EmbeddingResult::fresh(embedding))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn name(&self) -> &str {
        "hash"
    }
}
