// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed records for the review server's REST shapes.
//!
//! Keys the plugin does not use are kept in a flattened `extra` map so a
//! record re-serializes to the graph it was read from.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

fn is_zero(n: &i64) -> bool {
    *n == 0
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(rename = "_account_id", default, skip_serializing_if = "is_zero")]
    pub account_id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl AccountInfo {
    /// `Name <email>`, or whichever half is known.
    pub fn display(&self) -> String {
        match (self.name.is_empty(), self.email.is_empty()) {
            (false, false) => format!("{} <{}>", self.name, self.email),
            (false, true) => self.name.clone(),
            (true, false) => self.email.clone(),
            (true, true) => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevisionInfo {
    #[serde(rename = "_number", default, skip_serializing_if = "is_zero")]
    pub number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploader: Option<AccountInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub files: BTreeMap<String, FileInfo>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub project: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub updated: String,
    #[serde(rename = "_number", default, skip_serializing_if = "is_zero")]
    pub number: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<AccountInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_revision: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub revisions: BTreeMap<String, RevisionInfo>,
    #[serde(rename = "_more_changes", default, skip_serializing_if = "is_false")]
    pub more_changes: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ChangeInfo {
    /// The current revision's hash and record, when the server sent them.
    pub fn current(&self) -> Option<(&str, &RevisionInfo)> {
        let hash = self.current_revision.as_deref()?;
        self.revisions.get(hash).map(|rev| (hash, rev))
    }
}

/// One content block of a server-side file diff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffInfo {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub change_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<DiffContent>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl DiffInfo {
    /// Lines present only on the new side, in order.
    pub fn added_lines(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|c| c.b.as_ref()).flatten().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentInput {
    pub line: u32,
    pub message: String,
}

/// Body of `POST .../review`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewInput {
    pub message: String,
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<BTreeMap<String, Vec<CommentInput>>>,
}
