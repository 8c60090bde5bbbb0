//! Retrieval filtering — scopes nearest-neighbor hits to the active document,
//! applies the distance threshold and keyword overlap, and formats context.

pub mod filter;
pub mod types;

pub use filter::{format_context, KeywordOverlap, RetrievalFilter};
pub use types::*;
