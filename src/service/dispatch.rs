//! Job admission: validation, registration, and worker spawn
//!
//! Dispatch is fully non-blocking: the caller gets a job ID as soon as the
//! entry snapshot is registered, before any network activity. Everything
//! after that is observable only through the registry and the event channel.

use super::MediaDownloader;
use crate::error::{Error, Result};
use crate::types::{Event, JobId, JobSnapshot, MediaMetadata, QualitySelector, SubmitRequest};
use tracing::{info, warn};
use url::Url;

impl MediaDownloader {
    /// Validate a submission, register the job, and spawn its worker
    ///
    /// Returns the job ID immediately; by the time this returns the job is
    /// observable in the registry as `initializing`. Validation failures
    /// (empty or non-http(s) source, unparseable quality token) surface
    /// synchronously and register nothing.
    pub async fn submit(&self, request: SubmitRequest) -> Result<JobId> {
        let source = parse_source(&request.source)?;
        let selector = parse_selector(&request)?;

        // Capacity check with one eager sweep before refusing; a registry
        // full of stale errors should not block fresh work. The check and
        // the insert below do not share a lock, so concurrent submissions
        // racing at the cap can overshoot it by a few entries; the cap is
        // advisory, not a hard ceiling.
        let max = self.config.download.max_tracked_jobs;
        if self.registry.len().await >= max {
            self.registry
                .sweep_terminal_errors(self.config.error_job_ttl())
                .await;
            let active = self.registry.len().await;
            if active >= max {
                warn!(active, max, "submission refused, registry full");
                return Err(Error::RegistryFull { active });
            }
        }

        let id = JobId::new();
        self.registry.insert(JobSnapshot::initializing(id)).await;
        self.emit_event(Event::Queued { id });
        info!(job_id = %id, source = %source, selector = %selector, "job dispatched");

        let downloader = self.clone();
        tokio::spawn(async move {
            downloader.run_job(id, source, selector).await;
        });

        Ok(id)
    }

    /// Resolve source metadata synchronously, without creating a job
    pub async fn media_info(&self, source: &str) -> Result<MediaMetadata> {
        let url = parse_source(source)?;
        let metadata = self.fetcher.resolve(&url).await?;
        Ok(metadata)
    }
}

fn parse_source(source: &str) -> Result<Url> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("source is required".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| Error::Validation(format!("invalid source URL: {}", e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Validation(format!(
            "unsupported URL scheme '{}', expected http or https",
            other
        ))),
    }
}

/// An explicit `format_id` overrides the quality token; an absent quality
/// token means `highest`.
fn parse_selector(request: &SubmitRequest) -> Result<QualitySelector> {
    if let Some(format_id) = &request.format_id {
        if format_id.trim().is_empty() {
            return Err(Error::Validation("format_id must not be empty".to_string()));
        }
        return Ok(QualitySelector::Format(format_id.trim().to_string()));
    }

    match &request.quality {
        None => Ok(QualitySelector::default()),
        Some(token) => token
            .trim()
            .parse()
            .map_err(Error::Validation),
    }
}
