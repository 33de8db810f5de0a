// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insight-linters: static checks over a fetched changeset.
//!
//! Every linter takes a root directory plus relative file names and
//! returns findings; `/COMMIT_MSG` resolves to `<root>/COMMIT_MSG`.

pub mod commit;
pub mod kernel;
pub mod rules;

pub use commit::CommitLinter;
pub use kernel::KernelLinter;
pub use rules::{Rule, RULES};

use async_trait::async_trait;
use insight_core::{ErrorKind, Finding};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LintError {
    #[error("{tool} failed to run: {reason}")]
    Spawn { tool: &'static str, reason: String },
    #[error("lint worker failed: {0}")]
    Worker(String),
}

impl LintError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Execution
    }
}

/// A linter over files below a root directory
#[async_trait]
pub trait Linter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lint(&self, root: &Path, files: &[String]) -> Result<Vec<Finding>, LintError>;
}

/// Where a listed file lives on disk.
pub fn resolve(root: &Path, file: &str) -> PathBuf {
    root.join(file.trim_start_matches('/'))
}
