//! Job handlers: submission, progress polling, artifact collection.

use super::{ProgressResponse, SubmitResponse};
use crate::api::AppState;
use crate::error::{ApiError, Result};
use crate::types::{JobId, SubmitRequest};
use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

/// POST /jobs - Submit a retrieval job
///
/// Responds as soon as the job is admitted; transfer progress is observable
/// via `GET /jobs/{id}/progress`.
#[utoipa::path(
    post,
    path = "/jobs",
    tag = "jobs",
    request_body = SubmitRequest,
    responses(
        (status = 201, description = "Job admitted", body = SubmitResponse),
        (status = 400, description = "Invalid source or quality selector"),
        (status = 503, description = "Job registry is full")
    )
)]
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> Result<impl IntoResponse> {
    let job_id = state.downloader.submit(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse { ok: true, job_id }),
    ))
}

/// GET /jobs/{id}/progress - Poll a job's status and progress
#[utoipa::path(
    get,
    path = "/jobs/{id}/progress",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Current job state", body = ProgressResponse),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn job_progress(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_job_id(&raw_id) else {
        return unknown_job(&raw_id);
    };

    match state.downloader.registry.get(&id).await {
        Some(snapshot) => Json(ProgressResponse {
            ok: true,
            status: snapshot.status,
            progress: snapshot.progress,
            error: snapshot.error_detail,
        })
        .into_response(),
        None => unknown_job(&raw_id),
    }
}

/// GET /jobs/{id}/artifact - Stream a completed job's artifact
///
/// Serving schedules the artifact's reclamation after the configured grace
/// period; afterwards the job is gone entirely.
#[utoipa::path(
    get,
    path = "/jobs/{id}/artifact",
    tag = "jobs",
    params(
        ("id" = String, Path, description = "Job identifier")
    ),
    responses(
        (status = 200, description = "Artifact bytes as an attachment",
            content_type = "application/octet-stream"),
        (status = 404, description = "Unknown, unfinished, or reclaimed job")
    )
)]
pub async fn job_artifact(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Response {
    let Some(id) = parse_job_id(&raw_id) else {
        return unknown_job(&raw_id);
    };

    let artifact = match state.downloader.open_artifact(id).await {
        Ok(artifact) => artifact,
        Err(e) => return e.into_response(),
    };

    let content_type = artifact.content_type();
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_LENGTH, artifact.len.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// Malformed job IDs are indistinguishable from unknown ones: no job with
/// that identifier exists, so both answer 404.
fn parse_job_id(raw: &str) -> Option<JobId> {
    raw.parse().ok()
}

fn unknown_job(raw: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError::new(format!("job {raw} not found"))),
    )
        .into_response()
}
