//! Shared test fixtures for the service and API test suites

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::config::Config;
use crate::error::JobError;
use crate::fetcher::{DownloadRequest, Fetcher};
use crate::service::MediaDownloader;
use crate::types::{MediaMetadata, Rendition, TransferProgress};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use url::Url;

/// What the mock transfer should do after emitting its progress events
#[derive(Clone, Debug)]
pub(crate) enum MockOutcome {
    /// Write the artifact and return its path
    Success,
    /// Fail mid-transfer
    TransferError(String),
}

/// Scripted [`Fetcher`] with no external process
pub(crate) struct MockFetcher {
    /// Metadata to resolve, or an error message
    pub metadata: Result<MediaMetadata, String>,
    /// Progress samples emitted during the transfer, in order
    pub progress_events: Vec<TransferProgress>,
    /// Transfer outcome
    pub outcome: MockOutcome,
    /// Report a path differing from the requested one (remux simulation);
    /// the artifact is written with a `.webm` extension instead
    pub report_wrong_path: bool,
    /// Delay before resolving metadata, to observe pre-resolution states
    pub delay: Option<Duration>,
    /// Bytes written into the artifact on success
    pub artifact_bytes: Vec<u8>,
}

impl MockFetcher {
    pub fn succeeding() -> Self {
        Self {
            metadata: Ok(sample_metadata()),
            progress_events: vec![
                progress(250, 1000),
                progress(500, 1000),
                progress(1000, 1000),
            ],
            outcome: MockOutcome::Success,
            report_wrong_path: false,
            delay: None,
            artifact_bytes: b"fake media payload".to_vec(),
        }
    }

    pub fn failing_metadata(message: &str) -> Self {
        Self {
            metadata: Err(message.to_string()),
            ..Self::succeeding()
        }
    }

    pub fn failing_transfer(message: &str) -> Self {
        Self {
            outcome: MockOutcome::TransferError(message.to_string()),
            ..Self::succeeding()
        }
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::succeeding()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn resolve(&self, _source: &Url) -> Result<MediaMetadata, JobError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.metadata
            .clone()
            .map_err(JobError::MetadataResolution)
    }

    async fn download(
        &self,
        request: DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf, JobError> {
        for sample in &self.progress_events {
            progress.send(*sample).await.ok();
        }

        match &self.outcome {
            MockOutcome::TransferError(message) => Err(JobError::Transfer(message.clone())),
            MockOutcome::Success => {
                let written = if self.report_wrong_path {
                    request.dest.with_extension("webm")
                } else {
                    request.dest.clone()
                };
                tokio::fs::write(&written, &self.artifact_bytes)
                    .await
                    .map_err(|e| JobError::Transfer(e.to_string()))?;
                Ok(request.dest)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub(crate) fn progress(done: u64, total: u64) -> TransferProgress {
    TransferProgress {
        bytes_done: done,
        bytes_total: Some(total),
    }
}

/// The standard rendition table used across service tests:
/// 144p/360p/720p combined, 1080p video-only.
pub(crate) fn sample_renditions() -> Vec<Rendition> {
    let combined = |format_id: &str, height: u32| Rendition {
        format_id: format_id.to_string(),
        height: Some(height),
        fps: Some(30),
        filesize: Some(1000),
        container: "mp4".to_string(),
        has_video: true,
        has_audio: true,
    };
    vec![
        combined("160", 144),
        combined("134", 360),
        combined("22", 720),
        Rendition {
            has_audio: false,
            ..combined("137", 1080)
        },
    ]
}

pub(crate) fn sample_metadata() -> MediaMetadata {
    MediaMetadata {
        title: "Test Clip".to_string(),
        uploader: Some("someone".to_string()),
        duration_secs: Some(212),
        view_count: Some(1234),
        thumbnail_url: None,
        renditions: sample_renditions(),
    }
}

/// A downloader wired to a mock fetcher and a throwaway output directory
///
/// The grace period is long enough that no reclamation fires during a
/// test unless the test asks for it via
/// [`test_downloader_with_grace`].
pub(crate) async fn test_downloader(fetcher: MockFetcher) -> (MediaDownloader, TempDir) {
    test_downloader_with_grace(fetcher, 60).await
}

/// Like [`test_downloader`] with an explicit grace period in seconds
///
/// Reclamation tests use `0` so the timer fires immediately; handoff tests
/// use a period long enough that it never fires.
pub(crate) async fn test_downloader_with_grace(
    fetcher: MockFetcher,
    grace_period_secs: u64,
) -> (MediaDownloader, TempDir) {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.download.output_dir = dir.path().to_path_buf();
    config.download.grace_period_secs = grace_period_secs;

    let downloader = MediaDownloader::with_fetcher(config, Arc::new(fetcher))
        .await
        .expect("downloader");
    (downloader, dir)
}
