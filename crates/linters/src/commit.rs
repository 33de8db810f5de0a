// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rule-driven linter over a fetched changeset.

use crate::rules::{Rule, RULES};
use crate::{resolve, LintError, Linter};
use async_trait::async_trait;
use insight_core::Finding;
use std::path::Path;

#[derive(Clone)]
pub struct CommitLinter {
    rules: Vec<&'static dyn Rule>,
}

impl Default for CommitLinter {
    fn default() -> Self {
        Self { rules: RULES.to_vec() }
    }
}

impl std::fmt::Debug for CommitLinter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|r| r.name())).finish()
    }
}

impl CommitLinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the named rules, preserving evaluation order.
    pub fn only(names: &[&str]) -> Self {
        Self { rules: RULES.iter().copied().filter(|r| names.contains(&r.name())).collect() }
    }

    /// Run every rule over every file. Output is grouped by rule, then
    /// ordered by the input list. An unreadable file yields one finding
    /// carrying the I/O error and is skipped by the rules.
    pub fn lint_files(&self, root: &Path, files: &[String]) -> Vec<Finding> {
        let mut findings = Vec::new();
        let mut bodies: Vec<(&str, Vec<u8>)> = Vec::with_capacity(files.len());
        for file in files {
            match std::fs::read(resolve(root, file)) {
                Ok(body) => bodies.push((file.as_str(), body)),
                Err(e) => {
                    tracing::warn!(%file, error = %e, "cannot read file for linting");
                    findings.push(Finding::file_error(file.as_str(), e.to_string()));
                }
            }
        }

        for rule in &self.rules {
            for (file, body) in &bodies {
                if rule.applies(file) {
                    findings.extend(rule.check(file, body));
                }
            }
        }
        tracing::debug!(files = files.len(), findings = findings.len(), "commit lint done");
        findings
    }
}

#[async_trait]
impl Linter for CommitLinter {
    fn name(&self) -> &'static str {
        "commit"
    }

    async fn lint(&self, root: &Path, files: &[String]) -> Result<Vec<Finding>, LintError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        let linter = self.clone();
        let root = root.to_path_buf();
        let files = files.to_vec();
        tokio::task::spawn_blocking(move || linter.lint_files(&root, &files))
            .await
            .map_err(|e| LintError::Worker(e.to_string()))
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
