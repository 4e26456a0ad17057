use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum EmbedderError {
    #[error("embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("cache error: {0}")]
    Cache(String),
}

impl EmbedderError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EmbedderError::ModelUnavailable(_))
    }

    pub fn severity(&self) -> u8 {
        match self {
            EmbedderError::ModelUnavailable(_) => 2,
            EmbedderError::Cache(_) => 1,
        }
    }
}

impl From<navkit_vector_cache::VectorCacheError> for EmbedderError {
    fn from(value: navkit_vector_cache::VectorCacheError) -> Self {
        EmbedderError::Cache(value.to_string())
    }
}
