//! Embedding model used when the CLI is run without a neural backend wired
//! in: every call reports `ModelUnavailable`, so `DefaultDeltaEmbedder`
//! degrades to the deterministic fallback embedding and callers see
//! `degraded=true` on the resulting `QueryResult`/`ActionResult`.

use async_trait::async_trait;

use navkit_embedder::{EmbedderError, EmbeddingModel};

pub struct NullEmbeddingModel {
    dim: usize,
}

impl NullEmbeddingModel {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl EmbeddingModel for NullEmbeddingModel {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed_batch(&self, _inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError> {
        Err(EmbedderError::ModelUnavailable("no embedding backend configured".to_string()))
    }
}
