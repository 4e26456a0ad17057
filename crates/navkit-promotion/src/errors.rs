use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum PromotionError {
    #[error("promotion store io error: {0}")]
    Io(String),

    #[error("invalid promotion key: {0}")]
    InvalidKey(String),
}

impl PromotionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PromotionError::Io(_))
    }

    pub fn severity(&self) -> u8 {
        match self {
            PromotionError::Io(_) => 2,
            PromotionError::InvalidKey(_) => 1,
        }
    }
}
