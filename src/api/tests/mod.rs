use super::*;
use crate::service::test_helpers::MockFetcher;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Router plus the downloader behind it, wired to a mock fetcher
async fn test_app(fetcher: MockFetcher) -> (Router, Arc<MediaDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = crate::service::test_helpers::test_downloader(fetcher).await;
    let downloader = Arc::new(downloader);
    let config = Arc::new(downloader.get_config().clone());
    let app = create_router(downloader.clone(), config);
    (app, downloader, temp_dir)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Poll the progress endpoint until the job reports a terminal status
async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..500 {
        let response = app
            .clone()
            .oneshot(get(&format!("/jobs/{job_id}/progress")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        if json["status"] == "completed" || json["status"] == "error" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal status");
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (_, downloader, _temp_dir) = test_app(MockFetcher::succeeding()).await;

    let mut config = downloader.get_config().clone();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap(); // OS assigns a free port
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let downloader = downloader.clone();
        async move { start_api_server(downloader, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (_, downloader, _temp_dir) = test_app(MockFetcher::succeeding()).await;

    // Default test config binds a fixed port; rebuild on port 0
    let mut config = downloader.get_config().clone();
    config.server.bind_address = "127.0.0.1:0".parse().unwrap();
    let downloader = Arc::new(
        MediaDownloader::with_fetcher(
            config,
            Arc::new(MockFetcher::succeeding()),
        )
        .await
        .unwrap(),
    );

    let api_handle = downloader.spawn_api_server();

    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (_, downloader, _temp_dir) = test_app(MockFetcher::succeeding()).await;

    let mut config = downloader.get_config().clone();
    config.server.cors_enabled = true;
    config.server.cors_origins = vec!["*".to_string()];
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (_, downloader, _temp_dir) = test_app(MockFetcher::succeeding()).await;

    let mut config = downloader.get_config().clone();
    config.server.cors_enabled = false;
    let app = create_router(downloader, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response.headers().contains_key("access-control-allow-origin"),
        "CORS header must not be present when CORS is disabled"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _, _temp_dir) = test_app(MockFetcher::succeeding()).await;

    let response = app.oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
