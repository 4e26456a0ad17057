use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum VectorCacheError {
    #[error("io error: {0}")]
    Io(String),

    #[error("corrupt entry at {0}")]
    Corrupt(String),
}

impl VectorCacheError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VectorCacheError::Io(_))
    }

    pub fn severity(&self) -> u8 {
        match self {
            VectorCacheError::Io(_) => 1,
            VectorCacheError::Corrupt(_) => 2,
        }
    }
}
