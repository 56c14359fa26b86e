//! Error types for media-dl
//!
//! Two layers of errors exist:
//! - [`Error`] — synchronous errors surfaced directly to callers (validation,
//!   handoff misses, configuration, server plumbing)
//! - [`JobError`] — asynchronous job-execution errors; these never cross the
//!   worker boundary and are recorded in the registry as `error_detail`
//!   strings, observable only via polling
//!
//! HTTP status mapping lives here too, via [`ToHttpStatus`].

use crate::types::{JobId, JobStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing submit input (locator, quality token); surfaced
    /// synchronously, never via the async job path
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "ytdlp_path")
        key: Option<String>,
    },

    /// Job-execution error (only reaches callers through the synchronous
    /// `/info` path; workers absorb these into the registry instead)
    #[error(transparent)]
    Job(#[from] JobError),

    /// Job ID unknown to the registry
    #[error("job {id} not found")]
    JobNotFound {
        /// The job ID that was not found
        id: JobId,
    },

    /// Job exists but has not reached `completed`
    #[error("job {id} is not ready: status is {status}")]
    JobNotReady {
        /// The job ID whose artifact was requested
        id: JobId,
        /// The job's current status
        status: JobStatus,
    },

    /// Completed job's artifact vanished before handoff
    #[error("artifact for job {id} is no longer available")]
    ArtifactMissing {
        /// The job ID whose artifact is gone
        id: JobId,
    },

    /// Registry holds too many live jobs to accept another
    #[error("job registry is full: {active} jobs tracked")]
    RegistryFull {
        /// Number of jobs currently tracked
        active: usize,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

/// Asynchronous job-execution errors
///
/// Every variant carries a human-readable detail string; the worker records
/// `to_string()` of these into the registry on the `error` transition.
#[derive(Debug, Error)]
pub enum JobError {
    /// The fetcher could not resolve the source locator
    #[error("metadata resolution failed: {0}")]
    MetadataResolution(String),

    /// The quality policy found no matching rendition
    #[error("no suitable stream for selector '{selector}'")]
    NoSuitableStream {
        /// The selector that matched nothing
        selector: String,
    },

    /// Network or storage failure mid-download
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// The external fetcher binary could not be executed
    #[error("fetcher error: {0}")]
    Fetcher(String),
}

/// JSON error envelope returned by API endpoints
///
/// # Example JSON Response
///
/// ```json
/// { "ok": false, "error": "job 7c0a... not found" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Always false for error responses
    pub ok: bool,

    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    /// Create a new API error envelope
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code (used in logs and tests)
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - client error (invalid input)
            Error::Validation(_) => 400,
            Error::Config { .. } => 400,

            // 404 Not Found - NotReady and NotFound both answer 404,
            // distinguished only by message
            Error::JobNotFound { .. } => 404,
            Error::JobNotReady { .. } => 404,
            Error::ArtifactMissing { .. } => 404,

            // Job errors reach callers only through /info
            Error::Job(JobError::MetadataResolution(_)) => 400,
            Error::Job(JobError::NoSuitableStream { .. }) => 400,
            Error::Job(JobError::Transfer(_)) => 502,
            Error::Job(JobError::Fetcher(_)) => 502,

            // 500 Internal Server Error - server-side issues
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,

            // 503 Service Unavailable
            Error::RegistryFull { .. } => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation(_) => "validation_error",
            Error::Config { .. } => "config_error",
            Error::Job(e) => match e {
                JobError::MetadataResolution(_) => "metadata_resolution_failed",
                JobError::NoSuitableStream { .. } => "no_suitable_stream",
                JobError::Transfer(_) => "transfer_error",
                JobError::Fetcher(_) => "fetcher_error",
            },
            Error::JobNotFound { .. } => "job_not_found",
            Error::JobNotReady { .. } => "job_not_ready",
            Error::ArtifactMissing { .. } => "artifact_missing",
            Error::RegistryFull { .. } => "registry_full",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}
