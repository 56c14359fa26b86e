//! Metadata resolution handler: inspect a source without creating a job.

use super::{InfoQuery, InfoResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{Json, extract::Query, extract::State};

/// GET /info - Resolve source metadata without creating a job
#[utoipa::path(
    get,
    path = "/info",
    tag = "info",
    params(
        ("source" = String, Query, description = "Source locator (http/https URL)")
    ),
    responses(
        (status = 200, description = "Resolved metadata", body = InfoResponse),
        (status = 400, description = "Missing or invalid source, or unresolvable metadata"),
        (status = 502, description = "Fetcher failure")
    )
)]
pub async fn media_info(
    State(state): State<AppState>,
    Query(query): Query<InfoQuery>,
) -> Result<Json<InfoResponse>> {
    let source = query
        .source
        .ok_or_else(|| Error::Validation("source query parameter is required".to_string()))?;

    let metadata = state.downloader.media_info(&source).await?;

    Ok(Json(InfoResponse { ok: true, metadata }))
}
