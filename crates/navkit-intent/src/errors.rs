use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum IntentError {
    #[error("could not parse step: {0}")]
    Unparseable(String),
}

impl IntentError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        2
    }
}
