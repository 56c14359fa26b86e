//! Per-job async state machine
//!
//! One worker task owns each job's forward progression:
//! `initializing -> fetching_metadata -> downloading -> [processing] ->
//! completed`, with any failure absorbed into the `error` terminal state.
//! Workers never return errors to callers; the registry and the event
//! channel are the only observable outputs.

use super::MediaDownloader;
use crate::error::JobError;
use crate::fetcher::DownloadRequest;
use crate::quality::select_rendition;
use crate::types::{Event, JobId, JobStatus, QualitySelector, TransferProgress};
use crate::utils::{sanitize_title, unique_artifact_path};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

/// Progress written on entering `fetching_metadata`
const PROGRESS_RESOLVING: f32 = 5.0;
/// Progress written on entering `downloading`, before the first sample
const PROGRESS_TRANSFER_STARTED: f32 = 10.0;
/// Progress written on entering `processing`
const PROGRESS_FINALIZING: f32 = 95.0;

/// Buffered transfer samples; the fetcher never blocks on a slow worker
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

impl MediaDownloader {
    /// Drive one job to a terminal state
    ///
    /// Infallible by construction: any execution error becomes the job's
    /// `error_detail` and the `error` status.
    pub(crate) async fn run_job(&self, id: JobId, source: Url, selector: QualitySelector) {
        if let Err(e) = self.execute_job(id, source, selector).await {
            self.fail_job(id, &e).await;
        }
    }

    async fn execute_job(
        &self,
        id: JobId,
        source: Url,
        selector: QualitySelector,
    ) -> Result<(), JobError> {
        self.registry
            .update(&id, |s| {
                s.status = JobStatus::FetchingMetadata;
                s.progress = PROGRESS_RESOLVING;
            })
            .await;

        let metadata = self.fetcher.resolve(&source).await?;
        debug!(job_id = %id, title = %metadata.title, renditions = metadata.renditions.len(),
            "metadata resolved");
        self.emit_event(Event::MetadataResolved {
            id,
            title: metadata.title.clone(),
        });

        let rendition = select_rendition(&metadata.renditions, &selector)?;
        let stem = sanitize_title(&metadata.title);
        let dest = unique_artifact_path(
            self.config.output_dir(),
            &stem,
            &rendition.container,
            id,
        );

        self.registry
            .update(&id, |s| {
                s.status = JobStatus::Downloading;
                s.progress = PROGRESS_TRANSFER_STARTED;
            })
            .await;
        info!(job_id = %id, format_id = %rendition.format_id, dest = %dest.display(),
            "transfer started");

        let (tx, mut rx) = mpsc::channel::<TransferProgress>(PROGRESS_CHANNEL_CAPACITY);
        let request = DownloadRequest {
            source,
            format_id: rendition.format_id.clone(),
            dest,
        };

        let download = self.fetcher.download(request, tx);
        tokio::pin!(download);

        // Consume progress samples while the transfer runs. Once the fetcher
        // drops its sender the channel closes; the guard keeps the closed
        // recv arm from starving the select loop.
        let mut rx_open = true;
        let reported_path = loop {
            tokio::select! {
                sample = rx.recv(), if rx_open => {
                    match sample {
                        Some(sample) => self.apply_progress(id, sample).await,
                        None => rx_open = false,
                    }
                }
                result = &mut download => {
                    break result?;
                }
            }
        };
        // Samples buffered between the last poll and transfer completion
        // still apply, in arrival order
        while let Ok(sample) = rx.try_recv() {
            self.apply_progress(id, sample).await;
        }

        let artifact_path = self.finalize_artifact(id, reported_path).await?;

        self.registry
            .update(&id, |s| {
                s.status = JobStatus::Completed;
                s.artifact_path = Some(artifact_path.clone());
            })
            .await;
        info!(job_id = %id, path = %artifact_path.display(), "job completed");
        self.emit_event(Event::Completed { id, artifact_path });

        Ok(())
    }

    /// Fold one transfer sample into the registry
    ///
    /// Samples without a known total carry no percentage and are dropped;
    /// the registry keeps the last known value. Regressive samples are
    /// absorbed by the registry's monotonicity rule.
    async fn apply_progress(&self, id: JobId, sample: TransferProgress) {
        let Some(total) = sample.bytes_total.filter(|t| *t > 0) else {
            return;
        };
        let percent = (sample.bytes_done as f32 / total as f32 * 100.0).clamp(0.0, 100.0);

        self.registry
            .update(&id, |s| {
                s.progress = percent;
            })
            .await;
        self.emit_event(Event::Downloading { id, percent });
    }

    /// Verify the artifact exists where the fetcher says it is
    ///
    /// Fetchers may remux into a different container than requested, so the
    /// reported path can differ by extension. When the reported path is
    /// absent the job enters `processing` and the output directory is
    /// scanned for an entry with the reported path's exact file stem. The
    /// stem carries the collision suffix, so the scan cannot pick up a
    /// same-titled sibling job's artifact.
    async fn finalize_artifact(&self, id: JobId, reported: PathBuf) -> Result<PathBuf, JobError> {
        if tokio::fs::try_exists(&reported).await.unwrap_or(false) {
            return Ok(reported);
        }

        self.registry
            .update(&id, |s| {
                s.status = JobStatus::Processing;
                s.progress = PROGRESS_FINALIZING;
            })
            .await;
        debug!(job_id = %id, reported = %reported.display(),
            "reported artifact absent, scanning output directory");

        let expected_stem = reported.file_stem();
        let mut entries = tokio::fs::read_dir(self.config.output_dir())
            .await
            .map_err(|e| JobError::Transfer(format!("cannot scan output directory: {}", e)))?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if expected_stem.is_some() && path.file_stem() == expected_stem {
                return Ok(path);
            }
        }

        Err(JobError::Transfer(format!(
            "artifact not found after transfer (expected {})",
            reported.display()
        )))
    }

    /// Record a terminal failure
    async fn fail_job(&self, id: JobId, error: &JobError) {
        let detail = error.to_string();
        warn!(job_id = %id, error = %detail, "job failed");

        self.registry
            .update(&id, |s| {
                s.status = JobStatus::Error;
                s.error_detail = Some(detail.clone());
            })
            .await;
        self.emit_event(Event::Failed { id, error: detail });
    }
}
