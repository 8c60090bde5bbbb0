//! docrag core — configuration and the shared error type.

pub mod config;
pub mod error;

pub use config::RagConfig;
pub use error::{Error, Result};
