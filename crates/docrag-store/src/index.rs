//! In-memory embedding index: append-only chunk store with exact
//! nearest-neighbor search.
//!
//! Embeddings are L2-normalized on the way in and stacked into an (N, dim)
//! matrix, one row per entry, in insertion order. Search scores are squared
//! Euclidean distances between unit vectors (`2 - 2·cos`), so smaller is
//! closer and identical texts score 0.

use std::collections::HashSet;
use std::sync::Arc;

use ndarray::{Array1, Array2, Axis};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::types::*;
use docrag_core::{Error, Result};
use docrag_infer::EmbedderBackend;

/// Process-wide semantic index shared by ingestion and query paths.
///
/// Construct once and share behind an `Arc`. Inserts and removals take the
/// write lock for the whole append, so a search sees either none or all of
/// a batch.
pub struct EmbeddingIndex {
    embedder: Arc<dyn EmbedderBackend>,
    /// `None` until the first non-empty insert.
    inner: RwLock<Option<IndexInner>>,
}

struct IndexInner {
    dim: usize,
    /// Normalized embeddings, row `i` belongs to `entries[i]`.
    matrix: Array2<f32>,
    /// Squared norm of each row: 1.0, or 0.0 for an all-zero embedding.
    sq_norms: Vec<f32>,
    entries: Vec<IndexEntry>,
}

impl IndexInner {
    fn new(dim: usize) -> Self {
        Self {
            dim,
            matrix: Array2::zeros((0, dim)),
            sq_norms: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// Scale a vector to unit length; all-zero vectors are returned unchanged.
fn normalize(v: Array1<f32>) -> (Array1<f32>, f32) {
    let norm = v.dot(&v).sqrt();
    if norm < 1e-9 {
        (v, 0.0)
    } else {
        (v / norm, 1.0)
    }
}

impl EmbeddingIndex {
    pub fn new(embedder: Arc<dyn EmbedderBackend>) -> Self {
        Self {
            embedder,
            inner: RwLock::new(None),
        }
    }

    /// The embedding model used for both chunks and queries.
    pub fn embedder(&self) -> &Arc<dyn EmbedderBackend> {
        &self.embedder
    }

    /// Embed `chunks` and append one entry per chunk, all carrying `metadata`.
    ///
    /// The batch is embedded before the lock is taken; if embedding fails no
    /// entry from this batch is added. Returns the number of entries added.
    pub fn insert(&self, chunks: &[TextChunk], metadata: &ChunkMetadata) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != chunks.len() {
            return Err(Error::Inference(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let dim = self.embedder.dimension();
        let mut rows = Vec::with_capacity(embeddings.len());
        for result in embeddings {
            if result.embedding.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: result.embedding.len(),
                });
            }
            rows.push(normalize(result.embedding));
        }

        let indexed_at = chrono::Utc::now().timestamp();
        let mut guard = self.inner.write();
        let created = guard.is_none();
        let inner = guard.get_or_insert_with(|| IndexInner::new(dim));
        if inner.dim != dim {
            return Err(Error::DimensionMismatch {
                expected: inner.dim,
                actual: dim,
            });
        }

        for ((row, sq_norm), chunk) in rows.into_iter().zip(chunks) {
            inner
                .matrix
                .push_row(row.view())
                .map_err(|e| Error::Inference(format!("failed to append embedding: {e}")))?;
            inner.sq_norms.push(sq_norm);
            inner.entries.push(IndexEntry {
                chunk: Chunk::new(chunk, metadata),
                indexed_at,
            });
        }

        if created {
            info!("Created embedding index (dim={}, model={})", dim, self.embedder.name());
        }
        debug!(
            "Indexed {} chunks for document {} ({} total)",
            chunks.len(),
            metadata.document_id,
            inner.entries.len()
        );
        Ok(chunks.len())
    }

    /// Return the `k` entries nearest to `query`, ascending by distance.
    ///
    /// Equal distances keep insertion order. Fails with `EmptyIndex` when
    /// nothing is stored.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(Error::InvalidConfig("search fan-out k must be at least 1".into()));
        }
        if self.is_empty() {
            return Err(Error::EmptyIndex);
        }

        let (q, q_sq) = normalize(self.embedder.embed(query)?.embedding);

        let guard = self.inner.read();
        let inner = match guard.as_ref() {
            Some(inner) if !inner.entries.is_empty() => inner,
            _ => return Err(Error::EmptyIndex),
        };
        if q.len() != inner.dim {
            return Err(Error::DimensionMismatch {
                expected: inner.dim,
                actual: q.len(),
            });
        }

        // (N, dim) @ (dim,) → (N,)
        let dots = inner.matrix.dot(&q);
        let mut ranked: Vec<(usize, f32)> = dots
            .iter()
            .zip(&inner.sq_norms)
            .enumerate()
            .map(|(i, (&dot, &r_sq))| (i, (q_sq + r_sq - 2.0 * dot).max(0.0)))
            .collect();
        // Stable sort: ties stay in row (insertion) order.
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(k);

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: inner.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    /// Drop every entry belonging to `document_id`. Returns how many were removed.
    ///
    /// The index stays initialized even if this empties it.
    pub fn remove_by_document_id(&self, document_id: DocumentId) -> usize {
        let mut guard = self.inner.write();
        let Some(inner) = guard.as_mut() else {
            return 0;
        };

        let keep: Vec<usize> = inner
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.chunk.document_id() != document_id)
            .map(|(i, _)| i)
            .collect();
        let removed = inner.entries.len() - keep.len();
        if removed == 0 {
            return 0;
        }

        inner.matrix = inner.matrix.select(Axis(0), &keep);
        inner.sq_norms = keep.iter().map(|&i| inner.sq_norms[i]).collect();
        let mut idx = 0;
        inner.entries.retain(|_| {
            let kept = keep.binary_search(&idx).is_ok();
            idx += 1;
            kept
        });

        info!("Removed {} chunks of document {} from index", removed, document_id);
        removed
    }

    /// Whether any insert has ever populated the index.
    pub fn is_initialized(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.read().as_ref().map_or(0, |i| i.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunks of one document, in the order they were inserted.
    pub fn chunks_for_document(&self, document_id: DocumentId) -> Vec<Chunk> {
        self.inner
            .read()
            .as_ref()
            .map(|inner| {
                inner
                    .entries
                    .iter()
                    .filter(|e| e.chunk.document_id() == document_id)
                    .map(|e| e.chunk.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn stats(&self) -> IndexStats {
        let guard = self.inner.read();
        match guard.as_ref() {
            Some(inner) => IndexStats {
                initialized: true,
                entries: inner.entries.len(),
                documents: inner
                    .entries
                    .iter()
                    .map(|e| e.chunk.document_id())
                    .collect::<HashSet<_>>()
                    .len(),
                dimension: inner.dim,
            },
            None => IndexStats {
                dimension: self.embedder.dimension(),
                ..Default::default()
            },
        }
    }
}
