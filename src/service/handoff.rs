//! Artifact handoff
//!
//! Opening an artifact is the collection step of the job lifecycle: the
//! file handle goes to the caller for streaming, and reclamation of both
//! the file and the registry entry is scheduled after the grace period.

use super::MediaDownloader;
use crate::error::{Error, Result};
use crate::types::{Event, JobId, JobStatus};
use crate::utils::content_type_for;
use std::path::PathBuf;
use tracing::{info, warn};

/// An opened artifact ready for streaming to a client
#[derive(Debug)]
pub struct Artifact {
    /// Open read handle on the artifact file
    pub file: tokio::fs::File,

    /// Path the artifact lives at
    pub path: PathBuf,

    /// Filename suggested for the client's save dialog
    pub filename: String,

    /// Artifact size in bytes
    pub len: u64,
}

impl Artifact {
    /// Content-Type guessed from the artifact's extension
    pub fn content_type(&self) -> &'static str {
        content_type_for(&self.path)
    }
}

impl MediaDownloader {
    /// Open a completed job's artifact for streaming and schedule its
    /// reclamation
    ///
    /// Fails with `JobNotFound` for unknown IDs, `JobNotReady` for live or
    /// failed jobs, and `ArtifactMissing` when the file disappeared between
    /// completion and collection. Repeat calls within the grace period serve
    /// the same artifact again; each serve schedules its own reclamation and
    /// the earliest one still fires at its original deadline.
    pub async fn open_artifact(&self, id: JobId) -> Result<Artifact> {
        let snapshot = self
            .registry
            .get(&id)
            .await
            .ok_or(Error::JobNotFound { id })?;

        if snapshot.status != JobStatus::Completed {
            return Err(Error::JobNotReady {
                id,
                status: snapshot.status,
            });
        }

        let path = snapshot
            .artifact_path
            .ok_or(Error::ArtifactMissing { id })?;

        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            warn!(job_id = %id, path = %path.display(), error = %e,
                "completed artifact unreadable");
            Error::ArtifactMissing { id }
        })?;
        let len = file
            .metadata()
            .await
            .map_err(|_| Error::ArtifactMissing { id })?
            .len();

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.bin", id));

        self.cleanup.schedule(id, path.clone());
        self.emit_event(Event::ArtifactServed { id });
        info!(job_id = %id, filename = %filename, len, "artifact handed off");

        Ok(Artifact {
            file,
            path,
            filename,
            len,
        })
    }
}
