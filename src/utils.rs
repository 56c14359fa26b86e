//! Utility functions for artifact naming and path manipulation

use crate::types::JobId;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving filename collisions
const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Maximum length of a sanitized title stem
const MAX_STEM_LEN: usize = 120;

/// Sanitize a media title into a filesystem-safe filename stem
///
/// Keeps ASCII alphanumerics, spaces, dots, dashes, and underscores;
/// everything else becomes a space. Runs of whitespace collapse to a single
/// space, the result is trimmed and truncated, and an empty result falls
/// back to `"media"` so a stem always exists.
///
/// # Examples
///
/// ```
/// use media_dl::utils::sanitize_title;
///
/// assert_eq!(sanitize_title("My Video: Part 1/3"), "My Video Part 1 3");
/// assert_eq!(sanitize_title("../../etc/passwd"), ".. etc passwd");
/// assert_eq!(sanitize_title("***"), "media");
/// ```
pub fn sanitize_title(title: &str) -> String {
    let mapped: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                ' '
            }
        })
        .collect();

    let mut stem: String = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    // Leading dots would produce hidden files / relative-path lookalikes
    while stem.starts_with('.') {
        stem.remove(0);
    }
    stem.truncate(MAX_STEM_LEN);
    let stem = stem.trim().to_string();

    if stem.is_empty() {
        "media".to_string()
    } else {
        stem
    }
}

/// Build a collision-free artifact path under `dir`
///
/// The filesystem namespace is shared across all jobs, so artifact names
/// must be collision resistant: the sanitized stem gets a ` (N)` suffix if
/// the plain name is taken, and after exhausting the numeric range the job
/// ID itself becomes the uniqueness suffix.
pub fn unique_artifact_path(dir: &Path, stem: &str, extension: &str, job_id: JobId) -> PathBuf {
    let plain = dir.join(format!("{}.{}", stem, extension));
    if !plain.exists() {
        return plain;
    }

    for i in 1..=MAX_RENAME_ATTEMPTS {
        let candidate = dir.join(format!("{} ({}).{}", stem, i, extension));
        if !candidate.exists() {
            return candidate;
        }
    }

    dir.join(format!("{} [{}].{}", stem, job_id, extension))
}

/// Guess a Content-Type from an artifact's extension
///
/// Falls back to `application/octet-stream` for anything unrecognized.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4" | "m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        Some("opus" | "ogg") => "audio/ogg",
        _ => "application/octet-stream",
    }
}
