//! Concurrent-safe job-state registry
//!
//! The registry is the single shared surface between dispatchers, workers,
//! pollers, and the handoff path. Every mutation happens inside one write
//! critical section covering the whole composite record, so readers never
//! observe a half-written snapshot (e.g. `completed` without an
//! `artifact_path`).

use crate::types::{JobId, JobSnapshot, JobStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// In-memory registry of job snapshots, keyed by job ID
///
/// Safe under unbounded concurrent callers. Constructed once at startup and
/// passed explicitly to the dispatcher, workers, and handoff — never
/// accessed as ambient state.
#[derive(Debug, Default)]
pub struct ProgressRegistry {
    jobs: RwLock<HashMap<JobId, JobSnapshot>>,
}

impl ProgressRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new job snapshot
    ///
    /// Job IDs are uuid-v4 and never reused, so an existing entry under the
    /// same ID would indicate a dispatcher bug; it is logged and replaced.
    pub async fn insert(&self, snapshot: JobSnapshot) {
        let mut jobs = self.jobs.write().await;
        if let Some(previous) = jobs.insert(snapshot.id, snapshot) {
            warn!(job_id = %previous.id, "registry insert replaced an existing snapshot");
        }
    }

    /// Read a consistent snapshot of a job's state
    ///
    /// Returns a clone; the caller never holds the lock beyond this call.
    pub async fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Remove a job record, returning it if present
    pub async fn remove(&self, id: &JobId) -> Option<JobSnapshot> {
        self.jobs.write().await.remove(id)
    }

    /// Apply a composite mutation to a job's snapshot
    ///
    /// The closure runs under the write lock, so {status, progress,
    /// artifact_path, error_detail} change together or not at all. After the
    /// closure the registry enforces the snapshot invariants:
    /// - terminal snapshots are immutable — the mutation is refused
    /// - progress is clamped to 0..=100 and never regresses while live
    /// - `Error` pins progress to 0, `Completed` pins it to 100
    /// - `last_updated` is refreshed
    ///
    /// Returns `false` when the job is unknown or already terminal.
    pub async fn update<F>(&self, id: &JobId, mutate: F) -> bool
    where
        F: FnOnce(&mut JobSnapshot),
    {
        let mut jobs = self.jobs.write().await;
        let Some(snapshot) = jobs.get_mut(id) else {
            debug!(job_id = %id, "registry update on unknown job ignored");
            return false;
        };
        if snapshot.status.is_terminal() {
            warn!(
                job_id = %id,
                status = %snapshot.status,
                "registry update on terminal job refused"
            );
            return false;
        }

        let progress_before = snapshot.progress;
        mutate(snapshot);

        snapshot.progress = match snapshot.status {
            JobStatus::Error => 0.0,
            JobStatus::Completed => 100.0,
            _ => snapshot.progress.clamp(0.0, 100.0).max(progress_before),
        };
        snapshot.last_updated = Utc::now();
        true
    }

    /// Number of tracked jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether the registry is empty
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }

    /// Evict error-terminal jobs whose last mutation is older than `ttl`
    ///
    /// Completed jobs are evicted by the handoff cleanup path instead; this
    /// sweep only bounds growth from failed and abandoned jobs. Returns the
    /// number of evicted records.
    pub async fn sweep_terminal_errors(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(0));

        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, snapshot| {
            snapshot.status != JobStatus::Error || snapshot.last_updated > cutoff
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            debug!(evicted, "swept expired error-terminal jobs");
        }
        evicted
    }
}
