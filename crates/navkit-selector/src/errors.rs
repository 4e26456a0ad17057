use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SynthesizerError {
    #[error("no selector strategy produced a candidate for this element")]
    NoCandidates,
}

impl SynthesizerError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        2
    }
}
