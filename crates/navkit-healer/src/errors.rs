use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum HealerError {
    #[error("synthesizer error: {0}")]
    Synthesizer(String),

    #[error("promotion store error: {0}")]
    Promotion(String),
}

impl HealerError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        2
    }
}

impl From<navkit_selector::SynthesizerError> for HealerError {
    fn from(err: navkit_selector::SynthesizerError) -> Self {
        HealerError::Synthesizer(err.to_string())
    }
}

impl From<navkit_promotion::PromotionError> for HealerError {
    fn from(err: navkit_promotion::PromotionError) -> Self {
        HealerError::Promotion(err.to_string())
    }
}
