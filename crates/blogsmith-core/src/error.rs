use thiserror::Error;

use crate::job::JobStatus;

/// Application-wide error types for Blogsmith.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request could not be built or sent.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Text-generation API returned a non-success status.
    #[error("LLM error (HTTP {status_code}): {message}")]
    LlmError { message: String, status_code: u16 },

    /// A collaborator answered with a body we could not use.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Publishing target rejected the credentials or could not be reached.
    #[error("Connectivity check failed: {0}")]
    ConnectivityError(String),

    /// Caller supplied unusable input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A job status change that the lifecycle does not allow.
    #[error("Illegal job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    /// A batch is already running on this orchestrator.
    #[error("A batch is already in progress")]
    BatchInProgress,

    /// Publishing was attempted before a successful connectivity probe.
    #[error("Connection has not been verified; run a successful probe first")]
    NotVerified,

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
