//! Error types for the wealth advisor pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {

    // =============================
    // Input Validation
    // =============================

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The annuity formula's denominator is undefined for a
    /// zero or negative monthly rate.
    #[error("Degenerate rate: {0}")]
    DegenerateRate(String),

    // =============================
    // Completion Collaborator
    // =============================

    /// Transport-level failure: the collaborator could not be reached.
    #[error("Completion collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// The collaborator answered with a non-success status.
    #[error("Completion collaborator rejected request ({status}): {detail}")]
    CollaboratorRejected { status: u16, detail: String },

    /// The collaborator answered 2xx but the payload is missing the
    /// expected completion field.
    #[error("Malformed collaborator response: {0}")]
    MalformedCollaboratorResponse(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
