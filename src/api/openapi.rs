//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the media-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the media-dl REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that describes
/// all available endpoints, request/response types, and API behavior.
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation (if enabled)
#[derive(OpenApi)]
#[openapi(
    info(
        title = "media-dl REST API",
        version = "0.1.0",
        description = "REST API for dispatching remote-media retrieval jobs, polling their progress, and collecting completed artifacts",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8780", description = "Local development server")
    ),
    paths(
        // Info
        crate::api::routes::media_info,

        // Jobs
        crate::api::routes::submit_job,
        crate::api::routes::job_progress,
        crate::api::routes::job_artifact,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobId,
        crate::types::JobStatus,
        crate::types::JobSnapshot,
        crate::types::MediaMetadata,
        crate::types::Rendition,
        crate::types::SubmitRequest,
        crate::types::Event,

        // Config types from config.rs
        crate::config::Config,
        crate::config::DownloadConfig,
        crate::config::FetcherConfig,
        crate::config::ApiConfig,

        // API envelope types
        crate::error::ApiError,
        crate::api::routes::InfoResponse,
        crate::api::routes::SubmitResponse,
        crate::api::routes::ProgressResponse,
    )),
    tags(
        (name = "info", description = "Source metadata resolution"),
        (name = "jobs", description = "Retrieval job lifecycle"),
        (name = "system", description = "Health, events, and API documentation")
    )
)]
pub struct ApiDoc;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_generates_and_lists_every_route() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();

        let paths = json["paths"].as_object().unwrap();
        for path in [
            "/info",
            "/jobs",
            "/jobs/{id}/progress",
            "/jobs/{id}/artifact",
            "/health",
            "/openapi.json",
            "/events",
        ] {
            assert!(paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn spec_carries_the_core_schemas() {
        let spec = ApiDoc::openapi();
        let json = serde_json::to_value(&spec).unwrap();

        let schemas = json["components"]["schemas"].as_object().unwrap();
        for schema in ["JobStatus", "JobSnapshot", "MediaMetadata", "SubmitRequest"] {
            assert!(schemas.contains_key(schema), "missing schema {schema}");
        }
    }
}
