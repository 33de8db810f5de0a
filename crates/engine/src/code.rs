// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CodeSight: fetch a patchset, lint it, and vote on it.

use crate::error::SightError;
use crate::sight::{guarded, Outcome, Sight};
use async_trait::async_trait;
use base64::Engine;
use futures::TryFutureExt;
use insight_adapters::{Fetched, HttpTransport, ReqwestTransport, ReviewClient, ScratchDir};
use insight_core::{CodeInfo, CodeTrigger, Config, Finding};
use insight_linters::{CommitLinter, KernelLinter, Linter};
use std::path::{Component, Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Decoded copies of the fetched files live here, below the fetch root.
pub const DECODED_DIR: &str = "decoded";

pub struct CodeSight<T: HttpTransport = ReqwestTransport> {
    review: ReviewClient<T>,
    commit: CommitLinter,
    kernel: KernelLinter,
    work_dir: PathBuf,
}

impl CodeSight<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Self {
        let script = config.spec.code_config.checkpatch.clone().unwrap_or_else(KernelLinter::default_script);
        let kernel = KernelLinter::new(script).options(config.checkpatch_options()).env(config.env_pairs());
        Self::new(ReviewClient::from_config(&config.spec.review_config), kernel, config.work_dir())
    }
}

impl<T: HttpTransport> CodeSight<T> {
    pub fn new(review: ReviewClient<T>, kernel: KernelLinter, work_dir: impl Into<PathBuf>) -> Self {
        Self { review, commit: CommitLinter::new(), kernel, work_dir: work_dir.into() }
    }

    async fn lint(&self, root: &Path, files: &[String]) -> Result<Vec<Finding>, SightError> {
        let mut findings = self.commit.lint(root, files).await?;
        if self.kernel.available() {
            let sources: Vec<String> = files.iter().filter(|f| KernelLinter::accepts(f)).cloned().collect();
            if !sources.is_empty() {
                findings.extend(self.kernel.lint(root, &sources).await?);
            }
        } else {
            tracing::info!(script = %self.kernel.script().display(), "checkpatch not installed, skipping kernel lint");
        }
        Ok(findings)
    }

    async fn steps(&self, revision: &str, info: &mut CodeInfo, cancel: &CancellationToken) -> Result<(), SightError> {
        let fetched = guarded(cancel, self.review.fetch(&self.work_dir, revision).map_err(SightError::from)).await?;
        let scratch = ScratchDir::new(&fetched.path);
        info.project = fetched.project.clone();
        info.change = fetched.change;
        info.revision = fetched.revision.clone();

        let (root, files) = decode_all(&fetched)?;
        let findings = guarded(cancel, self.lint(&root, &files)).await?;
        info.findings = findings.iter().map(|f| f.to_string()).collect();

        if cancel.is_cancelled() {
            return Err(SightError::Canceled);
        }
        let vote = guarded(cancel, self.review.vote(revision, &findings).map_err(SightError::from)).await?;
        info.vote = vote.value().to_string();
        tracing::info!(change = vote.change, vote = %info.vote, findings = findings.len(), "code review posted");

        self.review.clean(&fetched.path)?;
        scratch.release();
        Ok(())
    }
}

/// Decode every stored `.base64` file into `<fetch>/decoded/<source path>`.
/// Returns the decoded root and the linter file list (server paths).
fn decode_all(fetched: &Fetched) -> Result<(PathBuf, Vec<String>), SightError> {
    let root = fetched.path.join(DECODED_DIR);
    let mut files = Vec::with_capacity(fetched.files.len());
    for file in &fetched.files {
        let relative = Path::new(file.source.trim_start_matches('/'));
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(SightError::Decode { path: file.source.clone(), reason: "path escapes the change".into() });
        }

        let stored = fetched.path.join(&file.stored);
        let encoded = std::fs::read(&stored).map_err(|source| SightError::Io { path: stored.clone(), source })?;
        let compact: Vec<u8> = encoded.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
        let body = base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| SightError::Decode { path: file.source.clone(), reason: e.to_string() })?;

        let target = root.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SightError::Io { path: parent.to_path_buf(), source })?;
        }
        std::fs::write(&target, body).map_err(|source| SightError::Io { path: target.clone(), source })?;
        files.push(file.source.clone());
    }
    Ok((root, files))
}

#[async_trait]
impl<T: HttpTransport> Sight for CodeSight<T> {
    type Trigger = CodeTrigger;
    type Info = CodeInfo;

    fn name(&self) -> &'static str {
        "code"
    }

    async fn run(&self, trigger: &CodeTrigger, cancel: &CancellationToken) -> Outcome<CodeInfo> {
        let gerrit = &trigger.gerrit_trigger;
        let Some(revision) = gerrit.revision() else {
            tracing::debug!("code trigger without revision, nothing to do");
            return Outcome::ok(CodeInfo::default());
        };

        let mut info = CodeInfo {
            project: gerrit.project.clone(),
            change: gerrit.change().unwrap_or_default(),
            revision: revision.to_string(),
            ..Default::default()
        };
        match self.steps(revision, &mut info, cancel).await {
            Ok(()) => Outcome::ok(info),
            Err(error) => {
                tracing::warn!(%revision, error = %error, "code sight failed");
                Outcome::failed(info, error)
            }
        }
    }
}

#[cfg(test)]
#[path = "code_tests.rs"]
mod tests;
