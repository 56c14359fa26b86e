//! Worker state-machine behavior: forward-only progression, failure
//! absorption, progress invariants, finalization.

use super::wait_for_terminal;
use crate::service::test_helpers::{MockFetcher, MockOutcome, progress, test_downloader};
use crate::types::{Event, JobStatus, SubmitRequest};
use std::time::Duration;

fn request(source: &str) -> SubmitRequest {
    SubmitRequest {
        source: source.to_string(),
        quality: None,
        format_id: None,
    }
}

#[tokio::test]
async fn happy_path_ends_completed_with_an_artifact() {
    let (downloader, _dir) = test_downloader(MockFetcher::succeeding()).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.progress, 100.0);
    assert!(snapshot.error_detail.is_none());

    let path = snapshot.artifact_path.unwrap();
    assert!(path.exists(), "artifact must exist on disk at completion");
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(
        name.starts_with("Test Clip"),
        "artifact name derives from the sanitized title, got {name}"
    );
    assert_eq!(std::fs::read(&path).unwrap(), b"fake media payload");
}

#[tokio::test]
async fn status_progression_is_forward_only() {
    let (downloader, _dir) = test_downloader(MockFetcher::succeeding()).await;
    let mut events = downloader.subscribe();

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();

    // Poll until terminal, recording every observed status
    let mut observed = Vec::new();
    loop {
        let snapshot = downloader.registry.get(&id).await.unwrap();
        if observed.last() != Some(&snapshot.status) {
            observed.push(snapshot.status);
        }
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    for pair in observed.windows(2) {
        assert!(
            pair[0].rank() < pair[1].rank(),
            "observed {} after {}",
            pair[1],
            pair[0]
        );
    }

    // The event stream carries the same story
    let mut saw_completed = false;
    while let Ok(event) = events.try_recv() {
        if matches!(event, Event::Completed { .. }) {
            saw_completed = true;
        }
    }
    assert!(saw_completed);
}

#[tokio::test]
async fn progress_samples_are_monotone_non_decreasing() {
    // Includes a regressive sample the registry must absorb
    let fetcher = MockFetcher {
        progress_events: vec![
            progress(300, 1000),
            progress(600, 1000),
            progress(450, 1000),
            progress(900, 1000),
        ],
        ..MockFetcher::succeeding()
    };
    let (downloader, _dir) = test_downloader(fetcher).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();

    let mut samples = Vec::new();
    loop {
        let snapshot = downloader.registry.get(&id).await.unwrap();
        samples.push(snapshot.progress);
        if snapshot.status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    for pair in samples.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "progress regressed from {} to {}",
            pair[0],
            pair[1]
        );
    }
}

#[tokio::test]
async fn metadata_failure_lands_in_error_with_detail() {
    let (downloader, _dir) =
        test_downloader(MockFetcher::failing_metadata("HTTP 410: gone")).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=gone"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Error);
    assert_eq!(snapshot.progress, 0.0, "error pins progress to zero");
    assert!(snapshot.artifact_path.is_none());
    let detail = snapshot.error_detail.unwrap();
    assert!(detail.contains("HTTP 410"), "detail was {detail}");

    // Terminal errors are immutable
    let applied = downloader
        .registry
        .update(&id, |s| s.progress = 50.0)
        .await;
    assert!(!applied);
}

#[tokio::test]
async fn unsatisfiable_selector_fails_the_job() {
    let fetcher = MockFetcher {
        metadata: Ok(crate::types::MediaMetadata {
            renditions: Vec::new(),
            ..crate::service::test_helpers::sample_metadata()
        }),
        ..MockFetcher::succeeding()
    };
    let (downloader, _dir) = test_downloader(fetcher).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Error);
    assert!(
        snapshot
            .error_detail
            .unwrap()
            .contains("no suitable stream")
    );
}

#[tokio::test]
async fn transfer_failure_lands_in_error() {
    let (downloader, _dir) =
        test_downloader(MockFetcher::failing_transfer("connection reset")).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Error);
    assert_eq!(snapshot.progress, 0.0);
    assert!(
        snapshot
            .error_detail
            .unwrap()
            .contains("connection reset")
    );
}

#[tokio::test]
async fn remuxed_artifact_is_found_by_the_finalization_scan() {
    // The fetcher writes `.webm` but reports the requested `.mp4` path; the
    // worker must recover via the output-directory scan
    let fetcher = MockFetcher {
        report_wrong_path: true,
        ..MockFetcher::succeeding()
    };
    let (downloader, _dir) = test_downloader(fetcher).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    let path = snapshot.artifact_path.unwrap();
    assert_eq!(path.extension().unwrap(), "webm");
    assert!(path.exists());
}

#[tokio::test]
async fn finalization_scan_never_picks_up_a_same_titled_sibling() {
    // A file with the same sanitized title already occupies the output
    // directory. The new job's destination gets a collision suffix, and the
    // remux scan must resolve to that suffixed stem, not the older file.
    let fetcher = MockFetcher {
        report_wrong_path: true,
        ..MockFetcher::succeeding()
    };
    let (downloader, dir) = test_downloader(fetcher).await;

    let sibling = dir.path().join("Test Clip.mp4");
    std::fs::write(&sibling, b"sibling payload").unwrap();

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    let path = snapshot.artifact_path.unwrap();
    assert_eq!(
        path.file_stem().unwrap().to_string_lossy(),
        "Test Clip (1)",
        "artifact must carry the collision-suffixed stem"
    );
    assert_eq!(path.extension().unwrap(), "webm");
    assert_eq!(std::fs::read(&path).unwrap(), b"fake media payload");

    // The older file is untouched and still holds its own bytes
    assert_eq!(std::fs::read(&sibling).unwrap(), b"sibling payload");
}

#[tokio::test]
async fn explicit_format_id_is_honored() {
    let (downloader, _dir) = test_downloader(MockFetcher::succeeding()).await;

    let id = downloader
        .submit(SubmitRequest {
            source: "https://example.com/watch?v=abc".into(),
            quality: Some("144p".into()),
            format_id: Some("137".into()),
        })
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    // Format 137 exists in the sample table (video-only), so the bypass
    // must complete rather than fail the combined-stream policy
    assert_eq!(snapshot.status, JobStatus::Completed);
}

#[tokio::test]
async fn transfer_with_unknown_total_still_completes() {
    let fetcher = MockFetcher {
        progress_events: vec![crate::types::TransferProgress {
            bytes_done: 4096,
            bytes_total: None,
        }],
        ..MockFetcher::succeeding()
    };
    let (downloader, _dir) = test_downloader(fetcher).await;

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    let snapshot = wait_for_terminal(&downloader, id).await;

    assert_eq!(snapshot.status, JobStatus::Completed);
    assert_eq!(snapshot.progress, 100.0);
}

#[tokio::test]
async fn failure_emits_a_failed_event() {
    let (downloader, _dir) =
        test_downloader(MockFetcher::failing_transfer("disk full")).await;
    let mut events = downloader.subscribe();

    let id = downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    wait_for_terminal(&downloader, id).await;

    let mut saw_failed = false;
    while let Ok(event) = events.try_recv() {
        if let Event::Failed { id: event_id, error } = event {
            assert_eq!(event_id, id);
            assert!(error.contains("disk full"));
            saw_failed = true;
        }
    }
    assert!(saw_failed);
    assert!(matches!(
        downloader.registry.get(&id).await.unwrap().status,
        JobStatus::Error
    ));
}

#[tokio::test]
async fn outcome_enum_is_exercised_by_both_arms() {
    // Guards the fixture itself: Success writes bytes, TransferError does not
    let (ok_downloader, ok_dir) = test_downloader(MockFetcher {
        outcome: MockOutcome::Success,
        ..MockFetcher::succeeding()
    })
    .await;
    let id = ok_downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    wait_for_terminal(&ok_downloader, id).await;
    assert!(std::fs::read_dir(ok_dir.path()).unwrap().next().is_some());

    let (err_downloader, err_dir) =
        test_downloader(MockFetcher::failing_transfer("boom")).await;
    let id = err_downloader
        .submit(request("https://example.com/watch?v=abc"))
        .await
        .unwrap();
    wait_for_terminal(&err_downloader, id).await;
    assert!(std::fs::read_dir(err_dir.path()).unwrap().next().is_none());
}
