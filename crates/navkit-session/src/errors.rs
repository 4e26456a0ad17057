use thiserror::Error;

use navkit_snapshot::SnapshotError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("wait for stable DOM timed out after {0:?}")]
    StableDomTimeout(std::time::Duration),

    #[error("cancelled")]
    Cancelled,
}

impl SessionError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::StableDomTimeout(_))
    }

    pub fn severity(&self) -> u8 {
        match self {
            SessionError::Snapshot(inner) => inner.severity(),
            SessionError::StableDomTimeout(_) => 1,
            SessionError::Cancelled => 0,
        }
    }
}
