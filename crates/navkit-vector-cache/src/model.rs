use serde::{Deserialize, Serialize};

/// One cached embedding. Key is the element fingerprint computed by the
/// Snapshot Builder / Delta Embedder.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub fingerprint: String,
    pub vector: Vec<f32>,
    pub model_id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: chrono::DateTime<chrono::Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_access: chrono::DateTime<chrono::Utc>,
    pub access_count: u64,
}

impl EmbeddingEntry {
    pub fn new(fingerprint: String, vector: Vec<f32>, model_id: String) -> Self {
        let now = chrono::Utc::now();
        Self {
            fingerprint,
            vector,
            model_id,
            created: now,
            last_access: now,
            access_count: 0,
        }
    }

    pub fn touch(&mut self) {
        self.last_access = chrono::Utc::now();
        self.access_count += 1;
    }

    /// Approximate on-disk/in-memory footprint, used against the byte budget.
    pub fn byte_size(&self) -> usize {
        self.vector.len() * std::mem::size_of::<f32>() + self.fingerprint.len() + self.model_id.len() + 48
    }
}
