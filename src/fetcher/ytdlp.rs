//! CLI-based fetcher using the external yt-dlp binary

use super::{DownloadRequest, Fetcher};
use crate::error::JobError;
use crate::types::{MediaMetadata, Rendition, TransferProgress};
use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::OnceLock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use url::Url;

/// CLI-based fetcher spawning the external `yt-dlp` binary
///
/// Metadata resolution runs `yt-dlp --dump-single-json`; transfers run
/// `yt-dlp -f <format> --newline -o <path>` with stdout progress lines
/// parsed into [`TransferProgress`] events.
///
/// # Examples
///
/// ```no_run
/// use media_dl::fetcher::YtDlpFetcher;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let fetcher = YtDlpFetcher::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let fetcher = YtDlpFetcher::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    cookie_file: Option<PathBuf>,
}

impl YtDlpFetcher {
    /// Create a new fetcher with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            cookie_file: None,
        }
    }

    /// Attempt to find yt-dlp in PATH
    ///
    /// Uses the `which` crate to search the system PATH.
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Attach a cookie/session file passed to every invocation
    pub fn with_cookie_file(mut self, cookie_file: Option<PathBuf>) -> Self {
        self.cookie_file = cookie_file;
        self
    }

    fn base_command(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("--no-playlist");
        if let Some(cookies) = &self.cookie_file {
            cmd.arg("--cookies").arg(cookies);
        }
        cmd
    }
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    async fn resolve(&self, source: &Url) -> Result<MediaMetadata, JobError> {
        let output = self
            .base_command()
            .arg("--dump-single-json")
            .arg(source.as_str())
            .output()
            .await
            .map_err(|e| JobError::Fetcher(format!("failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(JobError::MetadataResolution(last_stderr_line(
                &output.stderr,
            )));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| JobError::MetadataResolution(format!("unparseable metadata: {}", e)))?;

        Ok(parse_metadata(&value))
    }

    async fn download(
        &self,
        request: DownloadRequest,
        progress: mpsc::Sender<TransferProgress>,
    ) -> Result<PathBuf, JobError> {
        let mut child = self
            .base_command()
            .arg("-f")
            .arg(&request.format_id)
            .arg("--newline")
            .arg("-o")
            .arg(&request.dest)
            .arg(request.source.as_str())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| JobError::Fetcher(format!("failed to execute yt-dlp: {}", e)))?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(sample) = parse_progress_line(&line) {
                    // The receiver may have hung up; the transfer continues
                    // regardless
                    progress.send(sample).await.ok();
                } else {
                    debug!(line = %line, "yt-dlp output");
                }
            }
        } else {
            warn!("yt-dlp stdout not captured, progress reporting disabled");
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| JobError::Fetcher(format!("failed to wait for yt-dlp: {}", e)))?;

        if !output.status.success() {
            return Err(JobError::Transfer(last_stderr_line(&output.stderr)));
        }

        Ok(request.dest)
    }

    fn name(&self) -> &str {
        "yt-dlp"
    }
}

/// Map a yt-dlp info-JSON document onto [`MediaMetadata`]
///
/// Unknown or absent fields degrade to `None`; a missing format table
/// yields an empty rendition list (surfaced later as NoSuitableStream).
fn parse_metadata(value: &serde_json::Value) -> MediaMetadata {
    let renditions = value
        .get("formats")
        .and_then(|f| f.as_array())
        .map(|formats| formats.iter().filter_map(parse_rendition).collect())
        .unwrap_or_default();

    MediaMetadata {
        title: value
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("media")
            .to_string(),
        uploader: value
            .get("uploader")
            .and_then(|u| u.as_str())
            .map(String::from),
        duration_secs: value.get("duration").and_then(|d| d.as_u64()),
        view_count: value.get("view_count").and_then(|v| v.as_u64()),
        thumbnail_url: value
            .get("thumbnail")
            .and_then(|t| t.as_str())
            .map(String::from),
        renditions,
    }
}

fn parse_rendition(format: &serde_json::Value) -> Option<Rendition> {
    let format_id = format.get("format_id")?.as_str()?.to_string();
    // yt-dlp reports absent streams as the literal string "none"
    let stream_present =
        |key: &str| format.get(key).and_then(|c| c.as_str()).is_some_and(|c| c != "none");

    Some(Rendition {
        format_id,
        height: format
            .get("height")
            .and_then(|h| h.as_u64())
            .map(|h| h as u32),
        fps: format
            .get("fps")
            .and_then(|f| f.as_f64())
            .map(|f| f.round() as u32),
        filesize: format
            .get("filesize")
            .and_then(|s| s.as_u64())
            .or_else(|| format.get("filesize_approx").and_then(|s| s.as_u64())),
        container: format
            .get("ext")
            .and_then(|e| e.as_str())
            .unwrap_or("mp4")
            .to_string(),
        has_video: stream_present("vcodec"),
        has_audio: stream_present("acodec"),
    })
}

/// Parse one `--newline` progress line into a transfer sample
///
/// Matches lines like `[download]  42.5% of   10.55MiB at  1.2MiB/s` and
/// the `of ~` estimated-size variant. Lines without a known total carry no
/// byte information and are skipped; the worker holds its last value.
fn parse_progress_line(line: &str) -> Option<TransferProgress> {
    static PROGRESS_RE: OnceLock<Regex> = OnceLock::new();
    let re = PROGRESS_RE.get_or_init(|| {
        #[allow(clippy::expect_used)]
        let re = Regex::new(
            r"\[download\]\s+(\d+(?:\.\d+)?)%\s+of\s+~?\s*(\d+(?:\.\d+)?)(KiB|MiB|GiB|TiB|B)",
        )
        .expect("progress regex is valid");
        re
    });

    let captures = re.captures(line)?;
    let percent: f64 = captures.get(1)?.as_str().parse().ok()?;
    let size: f64 = captures.get(2)?.as_str().parse().ok()?;
    let unit = match captures.get(3)?.as_str() {
        "B" => 1.0,
        "KiB" => 1024.0,
        "MiB" => 1024.0 * 1024.0,
        "GiB" => 1024.0 * 1024.0 * 1024.0,
        "TiB" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return None,
    };

    let bytes_total = (size * unit) as u64;
    let bytes_done = (bytes_total as f64 * percent / 100.0) as u64;

    Some(TransferProgress {
        bytes_done,
        bytes_total: Some(bytes_total),
    })
}

fn last_stderr_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no error output")
        .to_string()
}
