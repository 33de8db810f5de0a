// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build log scanning for compiler diagnostics and failure keywords.

use insight_core::{Finding, LoggingConfig, LoggingInfo, LoggingTrigger, Severity, DEFAULT_LOGGING_COUNT};
use regex::Regex;
use std::sync::LazyLock;

/// Compiler-style `file:line[:col]: error|warning|fatal error: message`.
#[allow(clippy::expect_used)]
static DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?P<file>[^:\s]+):(?P<line>\d+):(?:\d+:)?\s*(?P<type>fatal error|error|warning):\s*(?P<msg>.*)$",
    )
    .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(error|failed|fatal)\b").expect("constant regex pattern is valid"));

/// One matched log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Empty for keyword-only matches.
    pub file: String,
    pub line: i64,
    /// `error`, `warning`, `fatal error`, or the keyword that matched.
    pub kind: String,
    pub message: String,
    /// The log line as printed.
    pub text: String,
}

impl Diagnostic {
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim_end();
        if let Some(caps) = DIAGNOSTIC.captures(text.trim_start()) {
            return Some(Self {
                file: caps["file"].to_string(),
                line: caps["line"].parse().unwrap_or(0),
                kind: caps["type"].to_lowercase(),
                message: caps["msg"].trim().to_string(),
                text: text.to_string(),
            });
        }
        let keyword = KEYWORD.captures(text)?;
        Some(Self {
            file: String::new(),
            line: 0,
            kind: keyword[1].to_lowercase(),
            message: text.trim().to_string(),
            text: text.to_string(),
        })
    }

    /// Review finding for diagnostics that point at a source line.
    pub fn finding(&self) -> Option<Finding> {
        if self.file.is_empty() || self.line <= 0 {
            return None;
        }
        let line = u32::try_from(self.line).ok()?;
        let severity = match self.kind.as_str() {
            "warning" => Severity::Warn,
            _ => Severity::Error,
        };
        Some(Finding::new(self.file.clone(), line, severity, self.message.clone()))
    }
}

/// Diagnostics found in a window of the build log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogScan {
    pub diagnostics: Vec<Diagnostic>,
    count: usize,
}

impl LogScan {
    /// Scan `trigger.lines[start..start+len]`. Zero trigger values take the
    /// configured window; a zero length means "to the end".
    pub fn new(trigger: &LoggingTrigger, config: &LoggingConfig) -> Self {
        let pick = |own: i64, fallback: i64| usize::try_from(if own > 0 { own } else { fallback }).unwrap_or(0);
        let total = trigger.lines.len();
        let start = pick(trigger.start, config.start).min(total);
        let end = match pick(trigger.len, config.len) {
            0 => total,
            len => start.saturating_add(len).min(total),
        };
        let count = match usize::try_from(config.count).unwrap_or(0) {
            0 => DEFAULT_LOGGING_COUNT,
            n => n,
        };

        let diagnostics = trigger.lines[start..end].iter().filter_map(|line| Diagnostic::parse(line)).collect();
        Self { diagnostics, count }
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Compiler-style diagnostics first, keyword matches as a fallback.
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| !d.file.is_empty()).or_else(|| self.diagnostics.first())
    }

    pub fn findings(&self) -> Vec<Finding> {
        self.diagnostics.iter().filter_map(Diagnostic::finding).collect()
    }

    pub fn info(&self) -> LoggingInfo {
        let Some(first) = self.first() else {
            return LoggingInfo::default();
        };
        LoggingInfo {
            file: first.file.clone(),
            line: first.line,
            kind: first.kind.clone(),
            detail: self.detail(),
        }
    }

    /// Up to `count` matched lines, newline-joined.
    pub fn detail(&self) -> String {
        self.diagnostics.iter().take(self.count).map(|d| d.text.as_str()).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
