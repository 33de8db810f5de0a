// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Info records produced by the sights and collapsed into one response.

use crate::report::NodeReport;
use crate::stat::NodeStat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerResponse {
    pub build_info: Option<BuildInfo>,
    pub code_info: Option<CodeInfo>,
    pub node_info: Option<NodeInfo>,
    pub mail_info: Option<MailInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildInfo {
    pub logging_info: LoggingInfo,
    pub repo_info: RepoInfo,
    pub review_info: ReviewInfo,
}

/// First diagnostic found in the build log window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingInfo {
    pub file: String,
    pub line: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoInfo {
    pub project: String,
    pub branch: String,
    pub commit: String,
    pub committer: String,
    pub author: String,
    pub message: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewInfo {
    pub project: String,
    pub branch: String,
    pub change: i64,
    pub owner: String,
    pub author: String,
    pub message: String,
    pub date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeInfo {
    pub project: String,
    pub change: i64,
    pub revision: String,
    /// Findings in `file:line:severity:message` form, CommitLinter first.
    pub findings: Vec<String>,
    /// `+1`, `-1`, or empty when no vote was posted.
    pub vote: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeInfo {
    pub node_stat: NodeStat,
    pub node_report: NodeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Notification proposed by a sight for the orchestrator to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailInfo {
    pub to: Vec<String>,
    pub subject: String,
    pub content: String,
}
