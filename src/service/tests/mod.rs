//! Integration-style tests for the job core, driven through
//! [`MediaDownloader`] with scripted mock fetchers.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod worker;

use crate::service::MediaDownloader;
use crate::types::{JobId, JobSnapshot};
use std::time::Duration;

/// Poll the registry until the job reaches a terminal state
///
/// Workers run on spawned tasks, so tests observe them the way API clients
/// do: by polling. Panics after a generous timeout.
pub(crate) async fn wait_for_terminal(downloader: &MediaDownloader, id: JobId) -> JobSnapshot {
    for _ in 0..500 {
        if let Some(snapshot) = downloader.registry.get(&id).await
            && snapshot.status.is_terminal()
        {
            return snapshot;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {id} never reached a terminal state");
}

/// Poll an async condition with a bounded real-time budget
///
/// Used where the observable effect runs on a spawned task (reclamation
/// timers) and there is no completion handle to await.
pub(crate) async fn poll_until<F, Fut>(what: &str, mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..500 {
        if condition().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition never held: {what}");
}
