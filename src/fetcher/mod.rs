//! External fetcher capability
//!
//! A [`Fetcher`] resolves source metadata and streams bytes for a chosen
//! rendition. The job core never talks to the network itself; it owns the
//! lifecycle and delegates retrieval here. Progress flows back as a stream
//! of [`TransferProgress`] events over an mpsc channel, decoupling the
//! fetcher's delivery mechanism from the registry update logic.

use crate::error::JobError;
use crate::types::{MediaMetadata, TransferProgress};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc;
use url::Url;

mod ytdlp;

pub use ytdlp::YtDlpFetcher;

/// Parameters for a single rendition transfer
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    /// Source locator
    pub source: Url,

    /// Format identifier of the chosen rendition
    pub format_id: String,

    /// Destination path the artifact should be written to
    ///
    /// Fetchers may adjust the extension (e.g. when remuxing); the returned
    /// path is what the fetcher believes it wrote, and the worker verifies
    /// it before completing the job.
    pub dest: PathBuf,
}

/// External retrieval capability (trait object for pluggable implementations)
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Resolve metadata for a source locator without downloading anything
    async fn resolve(&self, source: &Url) -> Result<MediaMetadata, JobError>;

    /// Stream a rendition to local storage
    ///
    /// Progress samples are sent through `progress` as they happen; the
    /// channel may be dropped by the receiver at any time and sends must
    /// not fail the transfer. Returns the path the artifact was written to.
    async fn download(
        &self,
        request: DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf, JobError>;

    /// Name of the fetcher implementation, for logs
    fn name(&self) -> &str;
}
