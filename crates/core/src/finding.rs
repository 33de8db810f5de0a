// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Linter findings.
//!
//! A finding renders as `<file>:<line>:<severity>:<message>`; line 0 marks
//! a file-level finding that is not anchored to a diff line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warn,
    Info,
}

crate::simple_display! {
    Severity {
        Error => "Error",
        Warn => "Warn",
        Info => "Info",
    }
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Error, Severity::Info, Severity::Warn];

    /// First severity whose lowercase name occurs in `text` (case-insensitive),
    /// checked in the order Error, Info, Warn.
    pub fn detect(text: &str) -> Option<Severity> {
        let lower = text.to_lowercase();
        Self::ALL.into_iter().find(|s| lower.contains(&s.to_string().to_lowercase()))
    }
}

impl FromStr for Severity {
    type Err = FindingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Error" => Ok(Severity::Error),
            "Warn" => Ok(Severity::Warn),
            "Info" => Ok(Severity::Info),
            other => Err(FindingParseError::Severity(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FindingParseError {
    #[error("expected file:line:severity:message, got {0:?}")]
    Shape(String),
    #[error("invalid line number {0:?}")]
    Line(String),
    #[error("unknown severity {0:?}")]
    Severity(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub file: String,
    pub line: u32,
    pub severity: Severity,
    pub message: String,
}

crate::builder! {
    pub struct FindingBuilder => Finding {
        into { file: String = "src/main.c", message: String = "bad" }
        set { line: u32 = 1, severity: Severity = Severity::Error }
    }
}

impl Finding {
    pub fn new(file: impl Into<String>, line: u32, severity: Severity, message: impl Into<String>) -> Self {
        Self { file: file.into(), line, severity, message: message.into() }
    }

    /// File-level error, the shape every CommitLinter rule emits.
    pub fn file_error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(file, 0, Severity::Error, message)
    }

    pub fn is_file_level(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.file, self.line, self.severity, self.message)
    }
}

impl FromStr for Finding {
    type Err = FindingParseError;

    /// The message may itself contain colons; file names may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(4, ':');
        let (Some(file), Some(line), Some(severity), Some(message)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(FindingParseError::Shape(s.to_string()));
        };
        let line = line.trim().parse().map_err(|_| FindingParseError::Line(line.to_string()))?;
        Ok(Finding { file: file.to_string(), line, severity: severity.parse()?, message: message.to_string() })
    }
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
