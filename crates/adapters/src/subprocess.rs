// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded subprocess execution.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for short local tools (docker CLI queries).
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single checkpatch invocation.
pub const LINT_TIMEOUT: Duration = Duration::from_secs(120);

/// Run `cmd` to completion, killing it if `timeout` elapses first.
///
/// The exit status is returned to the caller untouched; only spawn and
/// wait failures are errors. `label` names the tool in error messages.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    label: &str,
) -> Result<Output, String> {
    cmd.kill_on_drop(true);
    let child = cmd.output();
    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(format!("{} failed to run: {}", label, e)),
        Err(_) => Err(format!("{} timed out after {}s", label, timeout.as_secs())),
    }
}

/// Stdout followed by stderr, lossily decoded.
pub fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
