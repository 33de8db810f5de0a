// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wrapper over the kernel's `checkpatch.pl`.

use crate::{resolve, LintError, Linter};
use async_trait::async_trait;
use insight_adapters::subprocess::{run_with_timeout, LINT_TIMEOUT};
use insight_core::{Finding, Severity, DEFAULT_CHECKPATCH_OPTIONS};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub const SCRIPT_NAME: &str = "checkpatch.pl";

#[derive(Debug, Clone)]
pub struct KernelLinter {
    script: PathBuf,
    interpreter: String,
    options: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Duration,
}

impl KernelLinter {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            interpreter: "perl".to_string(),
            options: DEFAULT_CHECKPATCH_OPTIONS.iter().map(|s| s.to_string()).collect(),
            env: Vec::new(),
            timeout: LINT_TIMEOUT,
        }
    }

    /// `checkpatch.pl` next to the running executable.
    pub fn default_script() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(SCRIPT_NAME)))
            .unwrap_or_else(|| PathBuf::from(SCRIPT_NAME))
    }

    insight_core::setters! {
        into { interpreter: String }
        set { options: Vec<String>, env: Vec<(String, String)>, timeout: Duration }
    }

    pub fn script(&self) -> &Path {
        &self.script
    }

    /// Whether the script is installed; callers skip the linter otherwise.
    pub fn available(&self) -> bool {
        self.script.is_file()
    }

    /// Only C sources and headers are checked.
    pub fn accepts(file: &str) -> bool {
        file.ends_with(".c") || file.ends_with(".h")
    }

    async fn lint_one(&self, root: &Path, file: &str) -> Result<Vec<Finding>, LintError> {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg(&self.script)
            .args(&self.options)
            .arg("-f")
            .arg(resolve(root, file))
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        // checkpatch exits non-zero whenever it reports something
        let output = run_with_timeout(cmd, self.timeout, SCRIPT_NAME)
            .await
            .map_err(|reason| LintError::Spawn { tool: SCRIPT_NAME, reason })?;
        Ok(parse_output(file, &String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse terse `file:line: LEVEL: message` output. Lines with fewer than
/// four colon-separated fields are discarded.
pub fn parse_output(file: &str, text: &str) -> Vec<Finding> {
    text.lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            if fields.len() < 4 {
                return None;
            }
            let lnum = fields[1].trim().parse().unwrap_or(0);
            let severity = Severity::detect(fields[2]).unwrap_or(Severity::Info);
            let message = fields[3..].iter().map(|f| f.trim()).collect::<Vec<_>>().join(" ");
            Some(Finding::new(file, lnum, severity, message))
        })
        .collect()
}

#[async_trait]
impl Linter for KernelLinter {
    fn name(&self) -> &'static str {
        "kernel"
    }

    async fn lint(&self, root: &Path, files: &[String]) -> Result<Vec<Finding>, LintError> {
        let mut findings = Vec::new();
        for file in files {
            let found = self.lint_one(root, file).await?;
            tracing::debug!(%file, findings = found.len(), "checkpatch done");
            findings.extend(found);
        }
        Ok(findings)
    }
}

#[cfg(test)]
#[path = "kernel_tests.rs"]
mod tests;
