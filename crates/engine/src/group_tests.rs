// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

#[tokio::test]
async fn empty_group_has_no_error() {
    let group = TaskGroup::new(&CancellationToken::new(), 0);
    assert!(group.is_empty());
    assert!(group.wait().await.is_none());
}

#[tokio::test]
async fn workers_run_in_parallel_when_unbounded() {
    let mut group = TaskGroup::new(&CancellationToken::new(), 0);
    for _ in 0..3 {
        group.spawn("sleep", async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        });
    }
    assert_eq!(group.len(), 3);

    let started = Instant::now();
    assert!(group.wait().await.is_none());
    assert!(started.elapsed() < Duration::from_millis(550));
}

#[tokio::test]
async fn limit_bounds_concurrency() {
    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut group = TaskGroup::new(&CancellationToken::new(), 2);
    for _ in 0..6 {
        let (running, peak) = (running.clone(), peak.clone());
        group.spawn("count", async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        });
    }
    assert!(group.wait().await.is_none());
    assert_eq!(peak.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn first_error_cancels_the_rest() {
    let mut group = TaskGroup::new(&CancellationToken::new(), 0);
    let token = group.token();
    let seen = Arc::new(Mutex::new(Vec::new()));

    group.spawn("fails", async { Err(SightError::DetectOutput("boom".into())) });
    let log = seen.clone();
    group.spawn("waits", async move {
        tokio::select! {
            _ = token.cancelled() => {
                log.lock().push("canceled");
                Err(SightError::Canceled)
            }
            _ = tokio::time::sleep(Duration::from_secs(30)) => Ok(()),
        }
    });

    let started = Instant::now();
    let error = group.wait().await.unwrap();
    assert!(matches!(error, SightError::DetectOutput(_)), "{error}");
    assert_eq!(*seen.lock(), vec!["canceled"]);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn parent_cancellation_reaches_workers() {
    let parent = CancellationToken::new();
    let mut group = TaskGroup::new(&parent, 0);
    let token = group.token();
    group.spawn("waits", async move {
        token.cancelled().await;
        Err(SightError::Canceled)
    });
    parent.cancel();

    assert!(group.wait().await.unwrap().is_canceled());
}

#[tokio::test]
async fn panics_are_reported() {
    let mut group = TaskGroup::new(&CancellationToken::new(), 0);
    group.spawn("node", async { panic!("agent exploded") });

    match group.wait().await {
        Some(SightError::Panicked { sight, message }) => {
            assert_eq!(sight, "node");
            assert_eq!(message, "agent exploded");
        }
        other => panic!("unexpected {:?}", other),
    }
}
