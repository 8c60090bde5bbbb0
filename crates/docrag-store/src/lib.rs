//! docrag store — in-memory embedding index over document chunks.

pub mod index;
pub mod types;

pub use index::EmbeddingIndex;
pub use types::*;
