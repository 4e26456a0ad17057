use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum FusionError {
    #[error("invalid weight configuration: w_s + w_h must equal 1.0, got {0} + {1}")]
    InvalidWeights(f64, f64),
}

impl FusionError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        3
    }
}
