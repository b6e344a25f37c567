use thiserror::Error;

/// Errors surfaced by the query side (history listing).
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures of the audit capture pipeline.
///
/// None of these ever reach the business write that triggered the capture;
/// they are logged and the history entry is skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CaptureError {
    #[error("Snapshot capture failed: {0}")]
    CaptureFailure(String),
    #[error("Order not found")]
    NotFound,
    #[error("History persistence failed: {0}")]
    PersistenceFailure(String),
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),
}

impl From<DomainError> for CaptureError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidInput(msg) | DomainError::Internal(msg) => {
                CaptureError::PersistenceFailure(msg)
            }
        }
    }
}
