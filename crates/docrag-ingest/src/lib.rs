//! docrag ingest — text extraction, cleaning, chunking, document ingestion.

pub mod chunking;
pub mod clean;
pub mod file;
pub mod ingest;

pub use chunking::{Chunker, Chunks};
pub use clean::clean_text;
pub use file::{extract_text, FileType};
pub use ingest::Ingester;
