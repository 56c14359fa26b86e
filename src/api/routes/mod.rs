//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`info`] — Metadata resolution without a job
//! - [`jobs`] — Job submission, progress polling, artifact collection
//! - [`system`] — Health, events, OpenAPI

use crate::types::{JobId, JobStatus, MediaMetadata};
use serde::{Deserialize, Serialize};

mod info;
mod jobs;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use info::*;
pub use jobs::*;
pub use system::*;

// ============================================================================
// Query/Response Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /info
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct InfoQuery {
    /// Source locator to resolve
    pub source: Option<String>,
}

/// Response body for GET /info
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct InfoResponse {
    /// Always true for success responses
    pub ok: bool,
    /// Resolved source metadata
    pub metadata: MediaMetadata,
}

/// Response body for POST /jobs
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SubmitResponse {
    /// Always true for success responses
    pub ok: bool,
    /// Identifier of the admitted job
    pub job_id: JobId,
}

/// Response body for GET /jobs/{id}/progress
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProgressResponse {
    /// Always true for success responses
    pub ok: bool,
    /// Current lifecycle status
    pub status: JobStatus,
    /// Progress percentage, 0.0 to 100.0
    pub progress: f32,
    /// Failure detail, present only when status is `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
