// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insight-core: data model, configuration and parsers shared by the
//! insight plugin crates.

pub mod macros;

pub mod changeset;
pub mod config;
pub mod diff;
pub mod duration;
pub mod envelope;
pub mod error;
pub mod finding;
pub mod info;
pub mod report;
pub mod stat;
pub mod trigger;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use changeset::{ChangedFile, Changeset, FileStatus, COMMIT_MSG};
pub use config::{
    ArtifactConfig, BuildConfig, CodeConfig, Config, ConfigError, ConfigSpec, EnvVariable,
    GptConfig, LoggingConfig, Metadata, NodeConfig, RepoConfig, ReviewConfig, SshSettings,
    DEFAULT_CHECKPATCH_OPTIONS, DEFAULT_LOGGING_COUNT, DEFAULT_NODE_DURATION, DEFAULT_SSH_TIMEOUT,
};
pub use diff::{parse_multi_file, DiffParseError, FileDiff, Hunk, Line, LineKind};
pub use duration::{format_duration, parse_duration, DurationError};
pub use envelope::{strip_xssi, walk, DecodeError, PathSegment, XSSI_PREFIX};
pub use error::ErrorKind;
pub use finding::{Finding, FindingParseError, Severity};
pub use info::{
    BuildInfo, CodeInfo, LoggingInfo, MailInfo, NodeInfo, RepoInfo, ReviewInfo, TriggerResponse,
};
pub use report::{Facet, NodeReport};
pub use stat::NodeStat;
pub use trigger::{
    BuildTrigger, CodeTrigger, GerritTrigger, LoggingTrigger, NodeTrigger, SshConfig,
    TriggerRequest,
};
