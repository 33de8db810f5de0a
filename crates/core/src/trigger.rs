// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger payloads sent by the orchestrator. Immutable for a run.

use serde::{Deserialize, Serialize};

/// One request from the controller. A missing trigger skips its sight.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerRequest {
    pub build_trigger: Option<BuildTrigger>,
    pub code_trigger: Option<CodeTrigger>,
    pub node_trigger: Option<NodeTrigger>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildTrigger {
    pub logging_trigger: LoggingTrigger,
    pub gerrit_trigger: GerritTrigger,
}

/// Build log excerpt. `start`/`len` select the window to analyze; zero
/// values fall back to the configured logging window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingTrigger {
    pub lines: Vec<String>,
    pub start: i64,
    pub len: i64,
}

/// Change and patchset metadata as published by the review server's
/// event stream. Every field is a string on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GerritTrigger {
    pub host: String,
    pub port: String,
    pub project: String,
    pub topic: String,
    pub branch: String,
    pub event_type: String,
    pub scheme: String,
    pub refspec: String,
    #[serde(rename = "changeID")]
    pub change_id: String,
    pub change_url: String,
    pub change_number: String,
    pub change_subject: String,
    pub change_owner: String,
    pub change_owner_name: String,
    pub change_owner_email: String,
    #[serde(rename = "changeWIPState")]
    pub change_wip_state: String,
    pub change_private_state: String,
    pub change_commit_message: String,
    pub patchset_number: String,
    pub patchset_revision: String,
    pub patchset_uploader: String,
    pub patchset_uploader_name: String,
    pub patchset_uploader_email: String,
}

impl GerritTrigger {
    /// Change number, if present and numeric.
    pub fn change(&self) -> Option<i64> {
        self.change_number.trim().parse().ok()
    }

    pub fn revision(&self) -> Option<&str> {
        Some(self.patchset_revision.trim()).filter(|r| !r.is_empty())
    }
}

/// Code-change trigger. Without a patchset revision the sight is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeTrigger {
    pub gerrit_trigger: GerritTrigger,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeTrigger {
    pub ssh_config: SshConfig,
}

/// Connection settings for one remote node. `key` is a private key path;
/// when set, `pass` is its passphrase.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub host: String,
    pub port: i64,
    pub user: String,
    pub pass: String,
    pub key: String,
    pub timeout: String,
}

impl std::fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &if self.pass.is_empty() { "" } else { "<redacted>" })
            .field("key", &self.key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod tests;
