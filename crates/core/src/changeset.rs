// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A review change resolved for one commit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Pseudo-path under which the review server exposes the commit message.
pub const COMMIT_MSG: &str = "/COMMIT_MSG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileStatus {
    Added,
    Modified,
    Copied,
    Renamed,
    Deleted,
    Rewritten,
}

crate::simple_display! {
    FileStatus {
        Added => "A",
        Modified => "M",
        Copied => "C",
        Renamed => "R",
        Deleted => "D",
        Rewritten => "W",
    }
}

impl FileStatus {
    /// Server status letter; a missing status means modified.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("A") => FileStatus::Added,
            Some("C") => FileStatus::Copied,
            Some("R") => FileStatus::Renamed,
            Some("D") => FileStatus::Deleted,
            Some("W") => FileStatus::Rewritten,
            _ => FileStatus::Modified,
        }
    }

    /// Deleted and renamed-away files have no new content to materialize.
    pub fn is_materialized(self) -> bool {
        !matches!(self, FileStatus::Deleted | FileStatus::Renamed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    pub change_number: i64,
    pub revision_number: i64,
    pub project: String,
    pub current_revision: String,
    /// Sorted by path, D/R entries already removed.
    pub files: Vec<ChangedFile>,
    /// Path to base64 body as returned by the server.
    pub contents: BTreeMap<String, String>,
    /// Base64 of the unified diff.
    pub patch: String,
}

impl Changeset {
    pub fn touches_commit_message(&self) -> bool {
        self.files.iter().any(|f| f.path == COMMIT_MSG)
    }
}
