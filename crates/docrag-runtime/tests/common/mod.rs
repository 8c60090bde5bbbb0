use docrag_core::Result;
use docrag_infer::{EmbedderBackend, EmbeddingResult};
use ndarray::Array1;

/// Embeds text onto a handful of concept axes plus one catch-all axis.
///
/// Texts sharing a concept sit at distance 0; texts with disjoint concepts
/// sit at distance 2. Keeps threshold-sensitive assertions independent of
/// any real model.
pub struct ConceptEmbedder {
    concepts: Vec<Vec<&'static str>>,
}

impl ConceptEmbedder {
    pub fn new() -> Self {
        Self {
            concepts: vec![
                vec!["success", "succeed", "successful"],
                vec!["improve", "improvement", "better"],
                vec!["rust", "cargo", "borrow"],
            ],
        }
    }
}

impl EmbedderBackend for ConceptEmbedder {
    fn embed(&self, text: &str) -> Result<EmbeddingResult> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();

        let mut v = Array1::<f32>::zeros(self.dimension());
        for (axis, words) in self.concepts.iter().enumerate() {
            if tokens.iter().any(|t| words.contains(t)) {
                v[axis] = 1.0;
            }
        }
        if v.iter().all(|&x| x == 0.0) {
            v[self.concepts.len()] = 1.0;
        }
        let norm = v.dot(&v).sqrt();
        Ok(EmbeddingResult::fresh(v / norm))
    }

    fn dimension(&self) -> usize {
        self.concepts.len() + 1
    }

    fn name(&self) -> &str {
        "concept"
    }
}
