//! Runtime orchestrator — the two entrypoints of the service.
//!
//! `ingest` turns an uploaded file into indexed chunks; `answer` turns a
//! query and the active document id into response text.

pub mod orchestrator;
pub mod types;

pub use orchestrator::Orchestrator;
pub use types::*;
