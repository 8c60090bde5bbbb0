//! docrag infer — embedding backends and query cache.
//!
//! Provides the `EmbedderBackend` trait for generating embeddings.
//! When the `onnx` feature is enabled and model files are present,
//! `OnnxEmbedder` loads all-MiniLM-L6-v2 for 384-dim embeddings.
//! Without it, `HashEmbedder` gives deterministic lexical vectors.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;

pub use cache::{CachedEmbedder, QueryCache};
pub use embedder::{EmbedderBackend, EmbeddingResult, HashEmbedder};

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::sync::Arc;

use docrag_core::RagConfig;

/// Create the best available embedder for the given configuration.
///
/// Tries ONNX first (if feature enabled and model files present),
/// falls back to `HashEmbedder`. Either way the result is wrapped in a
/// query cache.
pub fn create_embedder(config: &RagConfig) -> Arc<dyn EmbedderBackend> {
    let backend: Arc<dyn EmbedderBackend> = select_backend(config);
    Arc::new(CachedEmbedder::new(backend, QueryCache::default_cache()))
}

fn select_backend(config: &RagConfig) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(&config.model_dir, config.embedding_dim) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Falling back to hash embedder.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    tracing::info!("ONNX feature disabled. Using hash embedder.");

    Arc::new(HashEmbedder::new(config.embedding_dim))
}
