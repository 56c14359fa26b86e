//! Job orchestration core
//!
//! [`MediaDownloader`] owns the registry, the fetcher, the event channel,
//! and the cleanup queue. It is cheap to clone and safe to share; the API
//! layer holds one behind an `Arc` and every HTTP handler goes through it.
//!
//! Submodules:
//! - `dispatch` — validation and job admission
//! - `worker` — the async per-job state machine
//! - `handoff` — artifact serving and grace-period scheduling
//! - `cleanup` — deferred reclamation of served artifacts

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetcher::{Fetcher, YtDlpFetcher};
use crate::registry::ProgressRegistry;
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

mod cleanup;
mod dispatch;
mod handoff;
mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
#[cfg(test)]
mod tests;

pub use handoff::Artifact;

use cleanup::CleanupQueue;

/// Capacity of the lifecycle event channel; slow subscribers lag rather
/// than block emitters
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Central service object coordinating job dispatch, tracking, and handoff
///
/// Clones share all state. Dropping every clone does not stop spawned
/// workers; call [`shutdown`](Self::shutdown) for an orderly stop.
#[derive(Clone)]
pub struct MediaDownloader {
    pub(crate) registry: Arc<ProgressRegistry>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) config: Arc<Config>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) cleanup: CleanupQueue,
    shutdown_token: CancellationToken,
}

impl MediaDownloader {
    /// Create a downloader, discovering the fetcher binary from config
    ///
    /// Resolution order: explicit `ytdlp_path`, then a PATH search when
    /// `search_path` is enabled. Fails with a config error when neither
    /// yields a binary. The output directory is created if absent.
    pub async fn new(config: Config) -> Result<Self> {
        let fetcher = match &config.fetcher.ytdlp_path {
            Some(path) => {
                debug!(path = %path.display(), "using configured yt-dlp path");
                YtDlpFetcher::new(path.clone())
            }
            None if config.fetcher.search_path => {
                YtDlpFetcher::from_path().ok_or_else(|| Error::Config {
                    message: "yt-dlp not found in PATH".to_string(),
                    key: Some("ytdlp_path".to_string()),
                })?
            }
            None => {
                return Err(Error::Config {
                    message: "no fetcher binary configured and PATH search is disabled"
                        .to_string(),
                    key: Some("ytdlp_path".to_string()),
                });
            }
        };
        let fetcher = fetcher.with_cookie_file(config.fetcher.cookie_file.clone());

        Self::with_fetcher(config, Arc::new(fetcher)).await
    }

    /// Create a downloader with an explicit fetcher implementation
    ///
    /// This is the seam tests use to inject mock fetchers.
    pub async fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher>) -> Result<Self> {
        tokio::fs::create_dir_all(config.output_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "cannot create output directory {}: {}",
                        config.output_dir().display(),
                        e
                    ),
                ))
            })?;

        let registry = Arc::new(ProgressRegistry::new());
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shutdown_token = CancellationToken::new();
        let cleanup = CleanupQueue::new(
            registry.clone(),
            event_tx.clone(),
            config.grace_period(),
            shutdown_token.clone(),
        );

        let downloader = Self {
            registry,
            fetcher,
            config: Arc::new(config),
            event_tx,
            cleanup,
            shutdown_token,
        };

        downloader.spawn_registry_sweeper();

        info!(
            fetcher = downloader.fetcher.name(),
            output_dir = %downloader.config.output_dir().display(),
            "media downloader initialized"
        );
        Ok(downloader)
    }

    /// Periodic eviction of expired error-terminal jobs
    ///
    /// Completed jobs are reclaimed by the handoff cleanup path; the sweep
    /// bounds growth from failed and never-collected jobs.
    fn spawn_registry_sweeper(&self) {
        let registry = self.registry.clone();
        let ttl = self.config.error_job_ttl();
        let sweep_interval = self.config.sweep_interval();
        let token = self.shutdown_token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            // The first tick fires immediately; skip it
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        registry.sweep_terminal_errors(ttl).await;
                    }
                    _ = token.cancelled() => {
                        debug!("registry sweeper stopped");
                        break;
                    }
                }
            }
        });
    }

    /// Subscribe to lifecycle events
    ///
    /// Each subscriber gets every event from the point of subscription; slow
    /// subscribers observe a lagged error and miss events rather than
    /// blocking the service.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit a lifecycle event to all subscribers (no-op without subscribers)
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Access the active configuration
    pub fn get_config(&self) -> &Config {
        &self.config
    }

    /// Spawn the REST API server on a background task
    ///
    /// Convenience wrapper around [`api::start_api_server`](crate::api::start_api_server)
    /// using this downloader's configuration.
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = Arc::new(downloader.get_config().clone());
        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }

    /// Initiate a graceful shutdown
    ///
    /// Cancels the registry sweeper and pending reclamation timers and
    /// notifies subscribers. In-flight transfers run to completion; their
    /// registry updates still apply.
    pub fn shutdown(&self) {
        info!("media downloader shutting down");
        self.emit_event(Event::Shutdown);
        self.shutdown_token.cancel();
    }
}

impl std::fmt::Debug for MediaDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaDownloader")
            .field("fetcher", &self.fetcher.name())
            .field("output_dir", &self.config.output_dir())
            .finish_non_exhaustive()
    }
}
