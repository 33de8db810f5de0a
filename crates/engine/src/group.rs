// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured fan-out: bounded workers, first error wins and cancels the rest.

use crate::error::SightError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct TaskGroup {
    set: JoinSet<Result<(), SightError>>,
    names: Vec<(tokio::task::Id, &'static str)>,
    limit: Option<Arc<Semaphore>>,
    cancel: CancellationToken,
}

impl TaskGroup {
    /// `limit` of 0 means unbounded. The group's token is a child of
    /// `parent`, so cancelling the parent reaches every worker.
    pub fn new(parent: &CancellationToken, limit: usize) -> Self {
        Self {
            set: JoinSet::new(),
            names: Vec::new(),
            limit: (limit > 0).then(|| Arc::new(Semaphore::new(limit))),
            cancel: parent.child_token(),
        }
    }

    /// Token workers should watch.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn spawn<F>(&mut self, name: &'static str, worker: F)
    where
        F: Future<Output = Result<(), SightError>> + Send + 'static,
    {
        let limit = self.limit.clone();
        let cancel = self.cancel.clone();
        let handle = self.set.spawn(async move {
            let _permit = match limit {
                Some(limit) => tokio::select! {
                    _ = cancel.cancelled() => return Err(SightError::Canceled),
                    permit = limit.acquire_owned() => Some(permit.map_err(|_| SightError::Canceled)?),
                },
                None => None,
            };
            worker.await
        });
        self.names.push((handle.id(), name));
    }

    fn name_of(&self, id: tokio::task::Id) -> &'static str {
        self.names.iter().find(|(i, _)| *i == id).map(|(_, n)| *n).unwrap_or("worker")
    }

    /// Join every worker. Returns the first error in completion order; that
    /// error cancels the group so the remaining workers wind down.
    pub async fn wait(mut self) -> Option<SightError> {
        let mut first: Option<SightError> = None;
        while let Some(joined) = self.set.join_next_with_id().await {
            let result = match joined {
                Ok((_, result)) => result,
                Err(e) => {
                    let sight = self.name_of(e.id());
                    if e.is_panic() {
                        Err(SightError::Panicked { sight, message: panic_message(e.into_panic()) })
                    } else {
                        Err(SightError::Canceled)
                    }
                }
            };
            match (result, first.is_some()) {
                (Ok(()), _) => {}
                (Err(e), false) => {
                    tracing::warn!(error = %e, "worker failed, cancelling group");
                    self.cancel.cancel();
                    first = Some(e);
                }
                (Err(e), true) => tracing::debug!(error = %e, "later worker error"),
            }
        }
        first
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload.downcast_ref::<&str>().map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()),
    }
}

#[cfg(test)]
#[path = "group_tests.rs"]
mod tests;
