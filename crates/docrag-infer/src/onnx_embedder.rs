//! ONNX-based embedding engine using all-MiniLM-L6-v2.
//!
//! Loads a SentenceTransformers ONNX model and tokenizer to generate
//! 384-dimensional float32 embeddings. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::info;

    use crate::embedder::{EmbedderBackend, EmbeddingResult};
    use docrag_core::{Error, Result};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    fn infer_err(context: &str, e: impl std::fmt::Display) -> Error {
        Error::Inference(format!("{context}: {e}"))
    }

    /// ONNX embedding engine using all-MiniLM-L6-v2.
    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load an ONNX model and tokenizer from the given directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx` — the ONNX model file
        /// - `model_dir/tokenizer.json` — the HuggingFace tokenizer
        pub fn load(model_dir: &Path, dimension: usize) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Inference(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Inference(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime.
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| infer_err("Failed to create session builder", e))?
                .with_intra_threads(2)
                .map_err(|e| infer_err("Failed to set threads", e))?
                .commit_from_file(&model_path)
                .map_err(|e| infer_err("Failed to load ONNX model", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| infer_err("Failed to load tokenizer", e))?;

            info!(
                "ONNX embedder loaded: dim={}, model={}",
                dimension,
                model_path.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                dimension,
            })
        }

        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| infer_err("Tokenization failed", e))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let attention_mask = &encoding.get_attention_mask()[..seq_len];

            let ids: Vec<i64> = encoding.get_ids()[..seq_len]
                .iter()
                .map(|&id| id as i64)
                .collect();
            let mask: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids = vec![0i64; seq_len];

            let ids = Tensor::from_array(([1usize, seq_len], ids))
                .map_err(|e| infer_err("ids tensor", e))?;
            let mask = Tensor::from_array(([1usize, seq_len], mask))
                .map_err(|e| infer_err("mask tensor", e))?;
            let type_ids = Tensor::from_array(([1usize, seq_len], type_ids))
                .map_err(|e| infer_err("type_ids tensor", e))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids, mask, type_ids])
                .map_err(|e| infer_err("ONNX inference failed", e))?;

            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| infer_err("Failed to extract output tensor", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            match dims.as_slice() {
                // Token embeddings [1, seq_len, dim]: mean pool over attended tokens.
                [_, _, dim] => {
                    let dim = *dim as usize;
                    let attended = attention_mask.iter().filter(|&&m| m > 0).count();
                    if attended == 0 {
                        return Err(Error::Inference("empty attention mask".into()));
                    }
                    let mut pooled = Array1::<f32>::zeros(dim);
                    for (i, &m) in attention_mask.iter().enumerate() {
                        if m == 0 {
                            continue;
                        }
                        let row = &data[i * dim..(i + 1) * dim];
                        pooled
                            .iter_mut()
                            .zip(row)
                            .for_each(|(acc, v)| *acc += v);
                    }
                    Ok(pooled / attended as f32)
                }
                // Sentence embedding [1, dim]: already pooled.
                [_, dim] => Ok(Array1::from_vec(data[..*dim as usize].to_vec())),
                other => Err(Error::Inference(format!(
                    "Unexpected output shape: {other:?}"
                ))),
            }
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<EmbeddingResult> {
            let embedding = self.infer(text)?;
            if embedding.len() != self.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
            Ok(EmbeddingResult::fresh(embedding))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn name(&self) -> &str {
            "onnx-minilm"
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
