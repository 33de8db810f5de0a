// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline contract shared by the build, code and node sights.

use crate::error::SightError;
use async_trait::async_trait;
use insight_core::MailInfo;
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// What a sight run produced. `info` is kept even when `error` is set so
/// partial results still reach the response.
#[derive(Debug)]
pub struct Outcome<I> {
    pub info: I,
    pub mail: Option<MailInfo>,
    pub error: Option<SightError>,
}

impl<I> Outcome<I> {
    pub fn ok(info: I) -> Self {
        Self { info, mail: None, error: None }
    }

    pub fn failed(info: I, error: SightError) -> Self {
        Self { info, mail: None, error: Some(error) }
    }

    pub fn with_mail(mut self, mail: Option<MailInfo>) -> Self {
        self.mail = mail;
        self
    }

    pub fn into_result(self) -> Result<I, SightError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.info),
        }
    }
}

/// A named pipeline turning one trigger into one info record.
#[async_trait]
pub trait Sight: Send + Sync + 'static {
    type Trigger: Send + Sync + 'static;
    type Info: Default + Send + 'static;

    fn name(&self) -> &'static str;

    async fn run(&self, trigger: &Self::Trigger, cancel: &CancellationToken) -> Outcome<Self::Info>;
}

/// Run `step` unless `cancel` fires first.
///
/// A step that loses the race is dropped; blocking work already handed to
/// the runtime finishes in the background under its own timeout.
pub async fn guarded<T, F>(cancel: &CancellationToken, step: F) -> Result<T, SightError>
where
    F: Future<Output = Result<T, SightError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SightError::Canceled),
        result = step => result,
    }
}

#[cfg(test)]
#[path = "sight_tests.rs"]
mod tests;
