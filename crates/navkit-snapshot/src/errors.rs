use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SnapshotError {
    #[error("driver denied capture: {0}")]
    CaptureDenied(String),

    #[error("malformed document from driver: {0}")]
    MalformedDocument(String),

    #[error("driver error: {0}")]
    Driver(String),
}

impl SnapshotError {
    pub fn is_retryable(&self) -> bool {
        false
    }

    pub fn severity(&self) -> u8 {
        match self {
            SnapshotError::CaptureDenied(_) => 2,
            SnapshotError::MalformedDocument(_) => 2,
            SnapshotError::Driver(_) => 1,
        }
    }
}

impl From<navkit_driver::DriverError> for SnapshotError {
    fn from(value: navkit_driver::DriverError) -> Self {
        SnapshotError::Driver(value.to_string())
    }
}
