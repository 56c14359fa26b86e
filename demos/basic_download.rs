//! Basic download example
//!
//! This example demonstrates the core functionality of media-dl:
//! - Configuring the downloader
//! - Subscribing to lifecycle events
//! - Submitting a retrieval job
//! - Collecting the finished artifact

use media_dl::config::{Config, DownloadConfig};
use media_dl::{Event, MediaDownloader, SubmitRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Build configuration; yt-dlp is discovered from PATH by default
    let config = Config {
        download: DownloadConfig {
            output_dir: "artifacts".into(),
            grace_period_secs: 30,
            ..Default::default()
        },
        ..Default::default()
    };

    // Create downloader instance
    let downloader = MediaDownloader::new(config).await?;

    // Subscribe to events
    let mut events = downloader.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Queued { id } => {
                    println!("✓ Queued job {}", id);
                }
                Event::MetadataResolved { id, title } => {
                    println!("ℹ Job {} resolved: {}", id, title);
                }
                Event::Downloading { id, percent } => {
                    println!("⬇ Job {}: {:.1}%", id, percent);
                }
                Event::Completed { id, artifact_path } => {
                    println!("✓ Job {} complete: {:?}", id, artifact_path);
                    break;
                }
                Event::Failed { id, error } => {
                    println!("✗ Job {} failed: {}", id, error);
                    break;
                }
                _ => {}
            }
        }
    });

    // Submit a retrieval job
    let job_id = downloader
        .submit(SubmitRequest {
            source: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            quality: Some("720p".to_string()),
            format_id: None,
        })
        .await?;

    println!("Submitted job {}", job_id);

    // Wait for the job to finish, then collect the artifact
    watcher.await?;

    if let Ok(artifact) = downloader.open_artifact(job_id).await {
        println!(
            "Artifact ready: {} ({} bytes) — reclaimed after the grace period",
            artifact.filename, artifact.len
        );
    }

    Ok(())
}
