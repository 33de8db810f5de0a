// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced by the sight pipelines.

use insight_adapters::{RepoError, ReviewError, SshError};
use insight_core::ErrorKind;
use insight_linters::LintError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SightError {
    #[error(transparent)]
    Target(SshError),
    #[error("detect failed: {0}")]
    Detect(SshError),
    #[error("detect failed: agent bootstrap printed {0:?}")]
    DetectOutput(String),
    #[error("health failed: {0}")]
    Health(SshError),
    #[error("stat failed: {0}")]
    Stat(SshError),
    #[error("stat failed: cannot decode agent output: {0}")]
    StatDecode(String),
    #[error("stat failed: agent output does not match NodeStat: {0}")]
    StatParse(String),
    #[error("report failed: {0}")]
    Report(String),
    #[error("review: {0}")]
    Review(#[from] ReviewError),
    #[error("repo: {0}")]
    Repo(#[from] RepoError),
    #[error("lint: {0}")]
    Lint(#[from] LintError),
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("canceled")]
    Canceled,
    #[error("{sight} worker panicked: {message}")]
    Panicked { sight: &'static str, message: String },
}

impl SightError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SightError::Target(e) | SightError::Detect(e) | SightError::Health(e) | SightError::Stat(e) => e.kind(),
            SightError::DetectOutput(_) | SightError::Report(_) | SightError::Panicked { .. } => ErrorKind::Execution,
            SightError::StatDecode(_) | SightError::Decode { .. } => ErrorKind::Decode,
            SightError::StatParse(_) => ErrorKind::Parse,
            SightError::Review(e) => e.kind(),
            SightError::Repo(e) => e.kind(),
            SightError::Lint(e) => e.kind(),
            SightError::Io { .. } => ErrorKind::Io,
            SightError::Canceled => ErrorKind::Canceled,
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.kind() == ErrorKind::Canceled
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
