//! REST API server example
//!
//! This example shows how to run media-dl with the REST API enabled,
//! allowing control via HTTP endpoints.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8780/swagger-ui
//! - Resolve metadata via GET http://localhost:8780/info?source=...
//! - Submit jobs via POST http://localhost:8780/jobs
//! - Stream events via GET http://localhost:8780/events

use media_dl::MediaDownloader;
use media_dl::api::start_api_server;
use media_dl::config::{ApiConfig, Config, DownloadConfig};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            output_dir: "artifacts".into(),
            ..Default::default()
        },
        server: ApiConfig {
            bind_address: "127.0.0.1:8780".parse::<SocketAddr>()?,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            swagger_ui: true,
        },
        ..Default::default()
    };

    // Create downloader instance
    let downloader = Arc::new(MediaDownloader::new(config.clone()).await?);
    let config_arc = Arc::new(config);

    println!("🚀 Starting media-dl REST API server");
    println!("📖 Swagger UI: http://localhost:8780/swagger-ui");
    println!("🔄 Events stream: http://localhost:8780/events");
    println!();
    println!("Example commands:");
    println!("  # Resolve metadata without creating a job");
    println!("  curl 'http://localhost:8780/info?source=https://example.com/watch?v=abc'");
    println!();
    println!("  # Submit a retrieval job");
    println!("  curl -X POST http://localhost:8780/jobs \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"source\": \"https://example.com/watch?v=abc\", \"quality\": \"720p\"}}'");
    println!();
    println!("  # Poll progress, then collect the artifact");
    println!("  curl http://localhost:8780/jobs/<id>/progress");
    println!("  curl -OJ http://localhost:8780/jobs/<id>/artifact");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:8780/events");

    // Start the API server (runs indefinitely)
    start_api_server(downloader, config_arc).await?;

    Ok(())
}
