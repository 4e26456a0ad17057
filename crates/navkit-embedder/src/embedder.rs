use async_trait::async_trait;
use tracing::{debug, warn};

use navkit_snapshot::Snapshot;
use navkit_vector_cache::{EmbeddingEntry, VectorCache};

use crate::errors::EmbedderError;
use crate::fallback::{fallback_embed, fallback_embed_text, FALLBACK_MODEL_ID};
use crate::input::model_input;

pub const DEFAULT_BATCH_SIZE: usize = 32;

#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    fn dim(&self) -> usize;
    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, EmbedderError>;
}

pub struct EmbedResult {
    /// `E`, aligned with `snapshot.elements` order.
    pub matrix: Vec<Vec<f32>>,
    pub reused_count: usize,
    /// Elements embedded with the deterministic fallback rather than the model.
    pub degraded_count: usize,
}

#[async_trait]
pub trait DeltaEmbedder: Send + Sync {
    async fn embed(
        &self,
        snapshot: &Snapshot,
        cache: &dyn VectorCache,
    ) -> Result<EmbedResult, EmbedderError>;

    /// Embeds free-standing query text (the parsed intent's target phrase),
    /// not backed by the Vector Cache since it carries no element fingerprint.
    /// Falls back to the deterministic hash embedding on model failure rather
    /// than failing the whole query, mirroring per-element degradation.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;
}

pub struct DefaultDeltaEmbedder<M: EmbeddingModel> {
    model: M,
    batch_size: usize,
}

impl<M: EmbeddingModel> DefaultDeltaEmbedder<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(model: M, batch_size: usize) -> Self {
        Self {
            model,
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl<M: EmbeddingModel> DeltaEmbedder for DefaultDeltaEmbedder<M> {
    async fn embed(
        &self,
        snapshot: &Snapshot,
        cache: &dyn VectorCache,
    ) -> Result<EmbedResult, EmbedderError> {
        let fingerprints: Vec<String> = snapshot.elements.iter().map(|e| e.fingerprint()).collect();
        let cached = cache.batch_get(&fingerprints).await?;

        let mut matrix: Vec<Option<Vec<f32>>> = vec![None; snapshot.elements.len()];
        let mut reused_count = 0;
        let mut degraded_count = 0;
        let mut miss_indices = Vec::new();

        for (idx, entry) in cached.into_iter().enumerate() {
            match entry {
                // A fallback-tagged entry never counts as a hit: the model
                // may have been unavailable only for the run that wrote it,
                // and reusing it here would silently keep this fingerprint
                // degraded forever instead of retrying the live model.
                Some(e) if e.model_id == FALLBACK_MODEL_ID => miss_indices.push(idx),
                Some(e) => {
                    matrix[idx] = Some(e.vector);
                    reused_count += 1;
                }
                None => miss_indices.push(idx),
            }
        }

        debug!(
            hits = reused_count,
            misses = miss_indices.len(),
            "delta embedder fingerprint lookup complete"
        );

        let mut new_entries = Vec::new();
        let mut chunks_attempted = 0usize;
        let mut chunks_failed = 0usize;

        for chunk in miss_indices.chunks(self.batch_size) {
            chunks_attempted += 1;
            let inputs: Vec<String> = chunk
                .iter()
                .map(|&idx| model_input(&snapshot.elements[idx]))
                .collect();

            match self.model.embed_batch(&inputs).await {
                Ok(vectors) => {
                    for (&idx, vector) in chunk.iter().zip(vectors.into_iter()) {
                        let fingerprint = fingerprints[idx].clone();
                        let entry = EmbeddingEntry::new(fingerprint, vector.clone(), self.model_id());
                        matrix[idx] = Some(vector);
                        new_entries.push(entry);
                    }
                }
                Err(err) => {
                    chunks_failed += 1;
                    warn!(error = %err, batch_size = chunk.len(), "embedding batch failed, using fallback vectors");
                    for &idx in chunk {
                        let descriptor = &snapshot.elements[idx];
                        let text = model_input(descriptor);
                        let vector = fallback_embed(&text, descriptor, self.model.dim());
                        let fingerprint = fingerprints[idx].clone();
                        let entry =
                            EmbeddingEntry::new(fingerprint, vector.clone(), FALLBACK_MODEL_ID.to_string());
                        matrix[idx] = Some(vector);
                        new_entries.push(entry);
                        degraded_count += 1;
                    }
                }
            }
        }

        if chunks_attempted > 0 && chunks_failed == chunks_attempted {
            return Err(EmbedderError::ModelUnavailable(
                "every embedding batch failed for this snapshot".to_string(),
            ));
        }

        if !new_entries.is_empty() {
            cache.batch_put(new_entries).await?;
        }

        let matrix: Vec<Vec<f32>> = matrix
            .into_iter()
            .map(|v| v.unwrap_or_default())
            .collect();

        Ok(EmbedResult {
            matrix,
            reused_count,
            degraded_count,
        })
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        match self.model.embed_batch(&[text.to_string()]).await {
            Ok(mut vectors) if !vectors.is_empty() => Ok(vectors.remove(0)),
            Ok(_) => Err(EmbedderError::ModelUnavailable(
                "embedding model returned no vector for query".to_string(),
            )),
            Err(err) => {
                warn!(error = %err, "query embedding failed, using fallback vector");
                Ok(fallback_embed_text(text, self.model.dim()))
            }
        }
    }
}

impl<M: EmbeddingModel> DefaultDeltaEmbedder<M> {
    fn model_id(&self) -> String {
        "model-v1".to_string()
    }
}
