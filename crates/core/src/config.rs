// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin configuration loaded from YAML.
//!
//! The document is read once at startup and then shared immutably
//! (`Arc<Config>`) by every component.

use crate::duration::{parse_duration, DurationError};
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Sampling window handed to the remote agent when none is configured.
pub const DEFAULT_NODE_DURATION: Duration = Duration::from_secs(10);

/// SSH connect-and-IO timeout when none is configured.
pub const DEFAULT_SSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Matched log lines kept in `LoggingInfo.detail` when `count` is unset.
pub const DEFAULT_LOGGING_COUNT: usize = 10;

/// Default checkpatch options, tuned for terse one-line-per-problem output.
pub const DEFAULT_CHECKPATCH_OPTIONS: &[&str] =
    &["--max-line-length=120", "--no-signoff", "--no-summary", "--no-tree", "--terse"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("missing required field: {0}")]
    Missing(&'static str),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("invalid duration in {field}: {source}")]
    Duration { field: &'static str, source: DurationError },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::Read { .. } => ErrorKind::Io,
            _ => ErrorKind::Config,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub spec: ConfigSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigSpec {
    pub env_variables: Vec<EnvVariable>,
    pub build_config: BuildConfig,
    pub code_config: CodeConfig,
    pub node_config: NodeConfig,
    pub artifact_config: ArtifactConfig,
    pub gpt_config: GptConfig,
    pub repo_config: RepoConfig,
    pub review_config: ReviewConfig,
    pub ssh_config: SshSettings,
    /// Dispatcher concurrency limit; 0 means unbounded.
    pub concurrency: usize,
    /// Scratch root for fetched changesets.
    pub work_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVariable {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildConfig {
    pub logging_config: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub start: i64,
    pub len: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    /// Path to `checkpatch.pl`; defaults to the copy next to the executable.
    pub checkpatch: Option<PathBuf>,
    /// Options passed before `-f <file>`; defaults to [`DEFAULT_CHECKPATCH_OPTIONS`].
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub duration: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub url: String,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GptConfig {
    pub url: String,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub url: String,
    pub user: String,
    pub pass: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub url: String,
    pub user: String,
    pub pass: String,
}

/// Default SSH settings for node triggers that leave fields blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SshSettings {
    pub host: String,
    pub port: i64,
    pub user: String,
    pub pass: String,
    pub key: String,
    pub timeout: String,
    pub strict_host_key: bool,
}

impl Config {
    /// Read and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config = Self::from_yaml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validation.
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Missing("apiVersion"));
        }
        if self.kind.trim().is_empty() {
            return Err(ConfigError::Missing("kind"));
        }

        let logging = &self.spec.build_config.logging_config;
        for (field, value) in [
            ("spec.buildConfig.loggingConfig.start", logging.start),
            ("spec.buildConfig.loggingConfig.len", logging.len),
            ("spec.buildConfig.loggingConfig.count", logging.count),
        ] {
            if value < 0 {
                return Err(ConfigError::Invalid { field, reason: format!("{} is negative", value) });
            }
        }

        self.node_duration()?;

        let ssh = &self.spec.ssh_config;
        if !ssh.host.is_empty() && !(1..=65535).contains(&ssh.port) {
            return Err(ConfigError::Invalid {
                field: "spec.sshConfig.port",
                reason: format!("{} is outside 1..65535", ssh.port),
            });
        }
        self.ssh_timeout()?;

        for var in &self.spec.env_variables {
            if var.name.is_empty() || var.name.contains('=') {
                return Err(ConfigError::Invalid {
                    field: "spec.envVariables",
                    reason: format!("bad variable name {:?}", var.name),
                });
            }
        }

        Ok(())
    }

    /// Agent sampling window (`spec.nodeConfig.duration`, default 10s).
    pub fn node_duration(&self) -> Result<Duration, ConfigError> {
        optional_duration(&self.spec.node_config.duration, "spec.nodeConfig.duration")
            .map(|d| d.unwrap_or(DEFAULT_NODE_DURATION))
    }

    /// Default SSH timeout (`spec.sshConfig.timeout`, default 10s).
    pub fn ssh_timeout(&self) -> Result<Duration, ConfigError> {
        optional_duration(&self.spec.ssh_config.timeout, "spec.sshConfig.timeout")
            .map(|d| d.unwrap_or(DEFAULT_SSH_TIMEOUT))
    }

    /// Checkpatch options, falling back to the terse defaults.
    pub fn checkpatch_options(&self) -> Vec<String> {
        match &self.spec.code_config.options {
            Some(options) => options.clone(),
            None => DEFAULT_CHECKPATCH_OPTIONS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Environment pairs exported to spawned subprocesses.
    pub fn env_pairs(&self) -> Vec<(String, String)> {
        self.spec.env_variables.iter().map(|v| (v.name.clone(), v.value.clone())).collect()
    }

    /// Scratch root for fetched changesets.
    pub fn work_dir(&self) -> PathBuf {
        self.spec.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn optional_duration(value: &str, field: &'static str) -> Result<Option<Duration>, ConfigError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_duration(value).map(Some).map_err(|source| ConfigError::Duration { field, source })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
