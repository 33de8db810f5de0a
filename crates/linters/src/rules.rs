// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CommitLinter rules.

use insight_core::{Finding, COMMIT_MSG};
use serde::de::IgnoredAny;

/// Subject length bounds, in characters.
pub const SUBJECT_MIN: usize = 25;
pub const SUBJECT_MAX: usize = 80;
pub const DESCRIPTION_MAX: usize = 80;

const CONFLICT_MARKERS: &[&str] = &["<<<<<<< HEAD", ">>>>>>> CHANGE"];
const CONFLICT_SKIP: &[&str] = &[".apk", ".bin", ".so"];

/// One file-level check.
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the rule looks at `file` at all.
    fn applies(&self, file: &str) -> bool;

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding>;
}

/// The rule set, in evaluation order.
pub static RULES: &[&dyn Rule] = &[&Conflict, &Json, &Message, &Newline, &Xml];

fn basename(file: &str) -> &str {
    file.rsplit('/').next().unwrap_or(file)
}

pub struct Conflict;

impl Rule for Conflict {
    fn name(&self) -> &'static str {
        "conflict"
    }

    fn applies(&self, file: &str) -> bool {
        !CONFLICT_SKIP.iter().any(|suffix| file.ends_with(suffix))
    }

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding> {
        let text = String::from_utf8_lossy(body);
        if CONFLICT_MARKERS.iter().any(|m| text.contains(m)) {
            vec![Finding::file_error(file, "Conflict character found")]
        } else {
            Vec::new()
        }
    }
}

pub struct Json;

impl Rule for Json {
    fn name(&self) -> &'static str {
        "json"
    }

    fn applies(&self, file: &str) -> bool {
        file.ends_with(".json")
    }

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding> {
        match serde_json::from_slice::<IgnoredAny>(body) {
            Ok(_) => Vec::new(),
            Err(e) => vec![Finding::file_error(file, e.to_string())],
        }
    }
}

/// Commit-message shape: subject within bounds, description lines short.
pub struct Message;

impl Message {
    /// Lines up to and including the first `Change-Id` line.
    fn body(text: &str) -> Vec<&str> {
        let mut lines: Vec<&str> = text.lines().map(|l| l.trim_end_matches('\r')).collect();
        if let Some(end) = lines.iter().position(|l| l.contains("Change-Id")) {
            lines.truncate(end + 1);
        }
        lines
    }
}

impl Rule for Message {
    fn name(&self) -> &'static str {
        "message"
    }

    fn applies(&self, file: &str) -> bool {
        file == COMMIT_MSG
    }

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding> {
        let text = String::from_utf8_lossy(body);
        let mut lines = Self::body(&text).into_iter().filter(|l| !l.trim().is_empty());
        let mut findings = Vec::new();

        let Some(subject) = lines.next() else {
            return vec![Finding::file_error(
                file,
                format!("Subject shorter than {} characters (found 0)", SUBJECT_MIN),
            )];
        };
        let len = subject.trim().chars().count();
        if len < SUBJECT_MIN {
            findings.push(Finding::file_error(
                file,
                format!("Subject shorter than {} characters (found {})", SUBJECT_MIN, len),
            ));
        } else if len > SUBJECT_MAX {
            findings.push(Finding::file_error(
                file,
                format!("Subject longer than {} characters (found {})", SUBJECT_MAX, len),
            ));
        }

        for line in lines {
            let len = line.chars().count();
            if len > DESCRIPTION_MAX {
                findings.push(Finding::file_error(
                    file,
                    format!("Description longer than {} characters (found {})", DESCRIPTION_MAX, len),
                ));
            }
        }
        findings
    }
}

pub struct Newline;

impl Rule for Newline {
    fn name(&self) -> &'static str {
        "newline"
    }

    fn applies(&self, file: &str) -> bool {
        file.ends_with(".te") || basename(file) == "file_contexts"
    }

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding> {
        if body.ends_with(b"\n") {
            Vec::new()
        } else {
            vec![Finding::file_error(file, "No newline at end of file")]
        }
    }
}

pub struct Xml;

impl Rule for Xml {
    fn name(&self) -> &'static str {
        "xml"
    }

    fn applies(&self, file: &str) -> bool {
        file.ends_with(".xml")
    }

    fn check(&self, file: &str, body: &[u8]) -> Vec<Finding> {
        let text = match std::str::from_utf8(body) {
            Ok(text) => text,
            Err(e) => return vec![Finding::file_error(file, format!("invalid UTF-8: {}", e))],
        };
        match roxmltree::Document::parse(text) {
            Ok(_) => Vec::new(),
            Err(e) => vec![Finding::file_error(file, e.to_string())],
        }
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
