//! Core types for media-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;
use uuid::Uuid;

/// Unique identifier for a retrieval job
///
/// Opaque to callers: generated at dispatch time, never reused for the
/// lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Generate a fresh random JobId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner Uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Job lifecycle status
///
/// Transitions are monotonic along
/// `Initializing -> FetchingMetadata -> Downloading -> Processing -> Completed`,
/// with `Error` reachable from every non-terminal state. `Completed` and
/// `Error` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Entry state, written by the dispatcher before the worker runs
    Initializing,
    /// Worker is resolving source metadata (title, renditions)
    FetchingMetadata,
    /// Worker is streaming bytes to local storage
    Downloading,
    /// Transient finalization (resolving the on-disk artifact path)
    Processing,
    /// Terminal success; `artifact_path` is populated
    Completed,
    /// Terminal failure; `error_detail` is populated
    Error,
}

impl JobStatus {
    /// Whether this status permits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Position along the forward progression, used to assert monotonicity
    pub fn rank(&self) -> u8 {
        match self {
            JobStatus::Initializing => 0,
            JobStatus::FetchingMetadata => 1,
            JobStatus::Downloading => 2,
            JobStatus::Processing => 3,
            JobStatus::Completed => 4,
            // Error is reachable from any non-terminal state; rank it above
            // everything so a forward-only check never rejects it
            JobStatus::Error => 5,
        }
    }

    /// Wire name of the status, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Initializing => "initializing",
            JobStatus::FetchingMetadata => "fetching_metadata",
            JobStatus::Downloading => "downloading",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked job's externally visible state
///
/// Snapshots are read by pollers and the handoff path; only the owning
/// worker mutates them, and every mutation goes through a single registry
/// critical section so readers never observe a half-written record.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobSnapshot {
    /// Unique job identifier
    pub id: JobId,

    /// Current lifecycle status
    pub status: JobStatus,

    /// Progress percentage, 0.0 to 100.0
    ///
    /// Non-decreasing while the job is live; pinned to 0 on `Error` and
    /// 100 on `Completed`.
    pub progress: f32,

    /// Path of the completed artifact (set only when status is `Completed`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_path: Option<PathBuf>,

    /// Human-readable failure detail (set only when status is `Error`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,

    /// Timestamp of the most recent mutation (observability only)
    pub last_updated: DateTime<Utc>,
}

impl JobSnapshot {
    /// Create the entry-state snapshot written at dispatch time
    pub fn initializing(id: JobId) -> Self {
        Self {
            id,
            status: JobStatus::Initializing,
            progress: 0.0,
            artifact_path: None,
            error_detail: None,
            last_updated: Utc::now(),
        }
    }
}

/// Metadata resolved for a source locator, without downloading anything
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct MediaMetadata {
    /// Media title
    pub title: String,

    /// Uploader / channel name (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader: Option<String>,

    /// Duration in seconds (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,

    /// View count (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,

    /// Thumbnail URL (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Available renditions, ordered as reported by the fetcher
    pub renditions: Vec<Rendition>,
}

/// One concrete encoded variant of a source media item
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Rendition {
    /// Fetcher-specific format identifier
    pub format_id: String,

    /// Vertical resolution in pixels (None for audio-only renditions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// Frames per second (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,

    /// File size in bytes (if known)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filesize: Option<u64>,

    /// Container extension (mp4, webm, ...)
    pub container: String,

    /// Whether the rendition carries a video stream
    pub has_video: bool,

    /// Whether the rendition carries an audio stream
    pub has_audio: bool,
}

impl Rendition {
    /// Whether this rendition combines video and audio in one container
    pub fn is_combined(&self) -> bool {
        self.has_video && self.has_audio
    }
}

/// Quality selection input for a retrieval job
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QualitySelector {
    /// Greatest available vertical resolution among combined renditions
    Highest,
    /// Smallest available vertical resolution among combined renditions
    Lowest,
    /// Best combined rendition not exceeding this height
    MaxHeight(u32),
    /// Exact format identifier, bypassing the policy
    Format(String),
}

impl Default for QualitySelector {
    fn default() -> Self {
        Self::Highest
    }
}

impl std::fmt::Display for QualitySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualitySelector::Highest => f.write_str("highest"),
            QualitySelector::Lowest => f.write_str("lowest"),
            QualitySelector::MaxHeight(h) => write!(f, "{}p", h),
            QualitySelector::Format(id) => write!(f, "format:{}", id),
        }
    }
}

impl std::str::FromStr for QualitySelector {
    type Err = String;

    /// Parse a quality token: `highest`, `lowest`, or `<digits>p`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "highest" => Ok(Self::Highest),
            "lowest" => Ok(Self::Lowest),
            token => {
                if let Some(digits) = token.strip_suffix('p')
                    && !digits.is_empty()
                    && let Ok(height) = digits.parse::<u32>()
                {
                    return Ok(Self::MaxHeight(height));
                }
                Err(format!("unknown quality token '{}'", token))
            }
        }
    }
}

/// Request body for submitting a retrieval job
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmitRequest {
    /// Source locator (http/https URL)
    #[serde(default)]
    pub source: String,

    /// Quality token (`highest`, `lowest`, `720p`, ...); defaults to `highest`
    #[serde(default)]
    pub quality: Option<String>,

    /// Explicit format identifier, overriding `quality` when present
    #[serde(default)]
    pub format_id: Option<String>,
}

/// One progress sample emitted by a fetcher during a transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes transferred so far
    pub bytes_done: u64,

    /// Total bytes expected, when the fetcher knows it
    pub bytes_total: Option<u64>,
}

/// Event emitted during the job lifecycle
///
/// Broadcast to all subscribers; the SSE endpoint forwards these verbatim.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Job accepted and recorded as `initializing`
    Queued {
        /// Job ID
        id: JobId,
    },

    /// Source metadata resolved
    MetadataResolved {
        /// Job ID
        id: JobId,
        /// Media title
        title: String,
    },

    /// Transfer progress update
    Downloading {
        /// Job ID
        id: JobId,
        /// Progress percentage (0.0 to 100.0)
        percent: f32,
    },

    /// Job reached `completed`
    Completed {
        /// Job ID
        id: JobId,
        /// Artifact path on local storage
        artifact_path: PathBuf,
    },

    /// Job reached `error`
    Failed {
        /// Job ID
        id: JobId,
        /// Failure detail
        error: String,
    },

    /// Artifact handed off to a client; reclamation scheduled
    ArtifactServed {
        /// Job ID
        id: JobId,
    },

    /// Artifact storage and registry entry reclaimed
    ArtifactReclaimed {
        /// Job ID
        id: JobId,
    },

    /// Graceful shutdown initiated
    Shutdown,
}
