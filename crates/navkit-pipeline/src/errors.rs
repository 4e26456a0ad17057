use thiserror::Error;

/// Error taxonomy by kind, not by implementation detail. `RouteChanged`
/// is deliberately absent: it is not a failure, it is classified by the
/// Session Manager and folded into [`crate::api::ActionResult::success`].
#[derive(Debug, Error, Clone)]
pub enum PipelineError {
    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),

    #[error("no candidate scored above the minimum confidence")]
    NoCandidate,

    #[error("locator verification failed: {0}")]
    LocatorVerificationFailed(String),

    #[error("action failed: {0}")]
    ActionFailed(String),

    #[error("cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        match self {
            PipelineError::SnapshotFailed(_) => 2,
            PipelineError::NoCandidate => 1,
            PipelineError::LocatorVerificationFailed(_) => 2,
            PipelineError::ActionFailed(_) => 3,
            PipelineError::Cancelled => 0,
        }
    }
}

impl From<navkit_snapshot::SnapshotError> for PipelineError {
    fn from(err: navkit_snapshot::SnapshotError) -> Self {
        PipelineError::SnapshotFailed(err.to_string())
    }
}

impl From<navkit_session::SessionError> for PipelineError {
    fn from(err: navkit_session::SessionError) -> Self {
        match err {
            navkit_session::SessionError::Snapshot(inner) => PipelineError::SnapshotFailed(inner.to_string()),
            navkit_session::SessionError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::SnapshotFailed(other.to_string()),
        }
    }
}

/// A step the Intent Parser cannot recognize scores no candidate: the
/// step is a no-op rather than an invalid-input class of its own.
impl From<navkit_intent::IntentError> for PipelineError {
    fn from(_err: navkit_intent::IntentError) -> Self {
        PipelineError::NoCandidate
    }
}

impl From<navkit_selector::SynthesizerError> for PipelineError {
    fn from(err: navkit_selector::SynthesizerError) -> Self {
        tracing::warn!(error = %err, "synthesizer produced no candidates");
        PipelineError::NoCandidate
    }
}

impl From<navkit_promotion::PromotionError> for PipelineError {
    fn from(err: navkit_promotion::PromotionError) -> Self {
        PipelineError::ActionFailed(format!("promotion store: {err}"))
    }
}

impl From<navkit_healer::HealerError> for PipelineError {
    fn from(err: navkit_healer::HealerError) -> Self {
        PipelineError::LocatorVerificationFailed(err.to_string())
    }
}
