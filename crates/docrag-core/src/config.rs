//! Pipeline configuration: chunking, retrieval, embedding and storage settings.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 800;
/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;
/// Default distance threshold; hits farther than this are dropped.
pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.3;
/// Default nearest-neighbor fan-out per query.
pub const DEFAULT_TOP_K: usize = 3;
/// Embedding dimension of all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

/// File extensions the extractor knows how to read.
pub const KNOWN_EXTENSIONS: &[&str] = &["txt", "pdf"];

/// Top-level docrag configuration.
///
/// Every field has a default, so a partial JSON file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks. Must be smaller than `chunk_size`.
    pub chunk_overlap: usize,
    /// Maximum distance (smaller is closer) a hit may have to survive filtering.
    pub score_threshold: f32,
    /// Number of nearest neighbors fetched per query.
    pub top_k: usize,
    /// Accepted file extensions, without the leading dot.
    pub supported_extensions: Vec<String>,
    /// Embedding vector length.
    pub embedding_dim: usize,
    /// Directory holding `model.onnx` and `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Directory uploaded files are stored in; used to derive chunk `file_path` metadata.
    pub uploads_dir: PathBuf,
    /// Truncate the assembled response to this many characters.
    pub max_response_chars: Option<usize>,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            supported_extensions: KNOWN_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            model_dir: PathBuf::from("models"),
            uploads_dir: PathBuf::from("uploads"),
            max_response_chars: None,
        }
    }
}

impl RagConfig {
    /// Create configuration from defaults overlaid with `DOCRAG_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file, then apply environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = match std::fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(Error::Io(e)),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(v) = env_parse("DOCRAG_CHUNK_SIZE")? {
            self.chunk_size = v;
        }
        if let Some(v) = env_parse("DOCRAG_CHUNK_OVERLAP")? {
            self.chunk_overlap = v;
        }
        if let Some(v) = env_parse("DOCRAG_SCORE_THRESHOLD")? {
            self.score_threshold = v;
        }
        if let Some(v) = env_parse("DOCRAG_TOP_K")? {
            self.top_k = v;
        }
        if let Some(v) = env_parse("DOCRAG_EMBEDDING_DIM")? {
            self.embedding_dim = v;
        }
        if let Ok(dir) = std::env::var("DOCRAG_MODEL_DIR") {
            self.model_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("DOCRAG_UPLOADS_DIR") {
            self.uploads_dir = PathBuf::from(dir);
        }
        if let Ok(exts) = std::env::var("DOCRAG_EXTENSIONS") {
            self.supported_extensions = exts
                .split(',')
                .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect();
        }
        Ok(())
    }

    /// Check the invariants every pipeline stage relies on.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be greater than 0".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(Error::InvalidConfig("top_k must be at least 1".into()));
        }
        if !self.score_threshold.is_finite() || self.score_threshold < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "score_threshold must be a non-negative distance, got {}",
                self.score_threshold
            )));
        }
        if self.embedding_dim == 0 {
            return Err(Error::InvalidConfig("embedding_dim must be greater than 0".into()));
        }
        if self.supported_extensions.is_empty() {
            return Err(Error::InvalidConfig("no supported file extensions configured".into()));
        }
        for ext in &self.supported_extensions {
            if !KNOWN_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
                return Err(Error::InvalidConfig(format!(
                    "extension '{}' has no extractor (known: {})",
                    ext,
                    KNOWN_EXTENSIONS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Whether `ext` (without dot, any case) is accepted for ingestion.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.supported_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidConfig(format!("{key}: cannot parse '{raw}'"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert_eq!(config.chunk_size, 800);
        assert_eq!(config.chunk_overlap, 150);
        assert_eq!(config.top_k, 3);
        assert!((config.score_threshold - 0.3).abs() < f32::EPSILON);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_size() {
        let config = RagConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let config = RagConfig {
            top_k: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let config = RagConfig {
            supported_extensions: vec!["txt".into(), "docx".into()],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docrag.json");
        std::fs::write(&path, r#"{"chunk_size": 400, "chunk_overlap": 50}"#).unwrap();

        let config = RagConfig::load(&path).unwrap();
        assert_eq!(config.chunk_size, 400);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.top_k, DEFAULT_TOP_K);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = RagConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docrag.json");
        std::fs::write(&path, r#"{"chunk_size": 100, "chunk_overlap": 200}"#).unwrap();
        assert!(matches!(RagConfig::load(&path), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_accepts_extension_case_insensitive() {
        let config = RagConfig::default();
        assert!(config.accepts_extension("PDF"));
        assert!(config.accepts_extension("txt"));
        assert!(!config.accepts_extension("md"));
    }
}
