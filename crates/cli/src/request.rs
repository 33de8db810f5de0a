// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Where the trigger request comes from.

use anyhow::Context;
use insight_core::TriggerRequest;
use std::io::Read;
use std::path::Path;

/// Read a request from `path`, or stdin when the path is `-`. No path
/// means an empty request.
pub fn read_request(path: Option<&Path>) -> anyhow::Result<TriggerRequest> {
    let Some(path) = path else {
        return Ok(TriggerRequest::default());
    };
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text).context("failed to read trigger from stdin")?;
        text
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read trigger {}", path.display()))?
    };
    parse_request(&text)
}

/// Blank input is an empty request.
pub fn parse_request(text: &str) -> anyhow::Result<TriggerRequest> {
    if text.trim().is_empty() {
        return Ok(TriggerRequest::default());
    }
    serde_json::from_str(text).context("failed to parse trigger request")
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
