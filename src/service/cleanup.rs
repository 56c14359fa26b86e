//! Deferred artifact reclamation
//!
//! Serving an artifact schedules its removal after a grace period instead
//! of reclaiming inline: the transport layer reports the response body as
//! sent before the client has necessarily received it, and deleting the
//! file at that point truncates the client's download. After the grace
//! period both the file and the registry entry go away together.

use crate::registry::ProgressRegistry;
use crate::types::{Event, JobId};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Schedules grace-period reclamation of served artifacts
///
/// Cheap to clone; all clones share the pending counter and shutdown token.
#[derive(Clone)]
pub(crate) struct CleanupQueue {
    registry: Arc<ProgressRegistry>,
    event_tx: broadcast::Sender<Event>,
    grace: Duration,
    shutdown: CancellationToken,
    pending: Arc<AtomicUsize>,
}

impl CleanupQueue {
    pub(crate) fn new(
        registry: Arc<ProgressRegistry>,
        event_tx: broadcast::Sender<Event>,
        grace: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            registry,
            event_tx,
            grace,
            shutdown,
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Schedule reclamation of a served artifact after the grace period
    ///
    /// Each call spawns an independent timer; re-serving an artifact within
    /// the grace period schedules a second reclamation whose file removal is
    /// an idempotent no-op.
    pub(crate) fn schedule(&self, id: JobId, path: PathBuf) {
        let queue = self.clone();
        self.pending.fetch_add(1, Ordering::SeqCst);
        debug!(job_id = %id, grace_secs = self.grace.as_secs(), "artifact reclamation scheduled");

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(queue.grace) => {
                    queue.reclaim(id, &path).await;
                }
                _ = queue.shutdown.cancelled() => {
                    // Artifacts live under the output directory; anything left
                    // behind at shutdown is reclaimed on the next startup or
                    // by the OS temp cleaner
                    debug!(job_id = %id, "reclamation cancelled by shutdown");
                }
            }
            queue.pending.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Remove the artifact file and the registry entry together
    async fn reclaim(&self, id: JobId, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(job_id = %id, path = %path.display(), "artifact reclaimed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(job_id = %id, "artifact already gone at reclamation time");
            }
            Err(e) => {
                // Leave the registry entry removal to proceed anyway; a
                // stranded file is preferable to a stranded record
                warn!(job_id = %id, error = %e, "failed to remove artifact file");
            }
        }

        self.registry.remove(&id).await;
        self.event_tx.send(Event::ArtifactReclaimed { id }).ok();
    }

    /// Number of reclamations currently waiting out their grace period
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}
