//! Error types for proctor-evidence crate.

use proctor_types::{AttemptId, SubjectId};
use thiserror::Error;

/// Errors that can occur during evidence operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvidenceError {
    /// Uploading identity does not own the attempt.
    #[error("subject {principal} may not upload evidence for {claimed}")]
    Unauthorized {
        principal: SubjectId,
        claimed: SubjectId,
    },

    /// Attempt was never registered with the store.
    #[error("unknown attempt: {0}")]
    UnknownAttempt(AttemptId),

    /// Upload carried no image data.
    #[error("empty frame")]
    EmptyFrame,

    /// No evidence stored under the path.
    #[error("evidence not found: {0}")]
    NotFound(String),

    /// Stored bytes no longer match their digest.
    #[error("evidence corrupted: {0}")]
    Corrupted(String),
}

/// Result type for evidence operations.
pub type EvidenceResult<T> = Result<T, EvidenceError>;
