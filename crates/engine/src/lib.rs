// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insight-engine: the build, code and node sights and the dispatcher
//! that runs them side by side.

mod build;
mod code;
mod error;
mod group;
mod insight;
mod logs;
mod node;
mod report;
mod sight;

pub use build::BuildSight;
pub use code::{CodeSight, DECODED_DIR};
pub use error::SightError;
pub use group::TaskGroup;
pub use insight::{Dispatch, Insight};
pub use logs::{Diagnostic, LogScan};
pub use node::{parse_stat, NodeSight, AGENT_BINARY, AGENT_SCRIPT, ARTIFACT_PATH, HEALTH_SCRIPT};
pub use report::ReportComposer;
pub use sight::{guarded, Outcome, Sight};
