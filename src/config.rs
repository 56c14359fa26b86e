//! Configuration types for media-dl

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use utoipa::ToSchema;

/// Artifact storage and job-registry behavior
///
/// Groups settings for where artifacts land, how long they survive after
/// handoff, and how aggressively terminal jobs are swept.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Directory where completed artifacts are written
    /// (default: `<system temp dir>/media-dl`)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Grace period between serving an artifact and reclaiming it, in
    /// seconds (default: 10)
    ///
    /// The transport layer may finish handing bytes to the network stack
    /// before the client has received them; reclaiming too early truncates
    /// in-flight downloads.
    #[serde(default = "default_grace_period_secs")]
    pub grace_period_secs: u64,

    /// How long error-terminal jobs stay in the registry before the sweep
    /// evicts them, in seconds (default: 3600)
    #[serde(default = "default_error_job_ttl_secs")]
    pub error_job_ttl_secs: u64,

    /// Interval between registry sweeps, in seconds (default: 300)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Maximum number of tracked jobs before new submissions are rejected
    /// (default: 512)
    #[serde(default = "default_max_tracked_jobs")]
    pub max_tracked_jobs: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            grace_period_secs: default_grace_period_secs(),
            error_job_ttl_secs: default_error_job_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_tracked_jobs: default_max_tracked_jobs(),
        }
    }
}

/// External fetcher binary configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct FetcherConfig {
    /// Path to the yt-dlp executable (auto-detected from PATH if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for the fetcher binary if no explicit path is
    /// set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Cookie/session file handed to the fetcher for authenticated sources
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: None,
            search_path: default_true(),
            cookie_file: None,
        }
    }
}

/// REST API server configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:8780)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Whether CORS headers are emitted (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" or empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Whether the interactive Swagger UI is mounted at /swagger-ui
    #[serde(default)]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: Vec::new(),
            swagger_ui: false,
        }
    }
}

/// Main configuration for [`MediaDownloader`](crate::MediaDownloader)
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) — artifact storage, grace period, sweeps
/// - [`fetcher`](FetcherConfig) — external binary discovery and credentials
/// - [`server`](ApiConfig) — REST API settings
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting).
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Artifact storage and registry behavior
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External fetcher binary settings
    #[serde(flatten)]
    pub fetcher: FetcherConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ApiConfig,
}

// Convenience accessors for duration-typed settings.
impl Config {
    /// Artifact output directory
    pub fn output_dir(&self) -> &PathBuf {
        &self.download.output_dir
    }

    /// Grace period between handoff and reclamation
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.download.grace_period_secs)
    }

    /// TTL for error-terminal jobs
    pub fn error_job_ttl(&self) -> Duration {
        Duration::from_secs(self.download.error_job_ttl_secs)
    }

    /// Interval between registry sweeps
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.download.sweep_interval_secs)
    }
}

fn default_output_dir() -> PathBuf {
    std::env::temp_dir().join("media-dl")
}

fn default_grace_period_secs() -> u64 {
    10
}

fn default_error_job_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_tracked_jobs() -> usize {
    512
}

fn default_bind_address() -> SocketAddr {
    // Port chosen to avoid the common 8000/8080 development range
    "127.0.0.1:8780".parse().unwrap_or_else(|_| {
        SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 8780)
    })
}

fn default_true() -> bool {
    true
}
