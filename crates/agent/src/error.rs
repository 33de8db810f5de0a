// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use thiserror::Error;

/// Why one section of the snapshot could not be collected.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {what}: {detail}")]
    Parse { what: &'static str, detail: String },
    #[error("{0}")]
    Tool(String),
}

impl CollectError {
    pub fn parse(what: &'static str, detail: impl Into<String>) -> Self {
        Self::Parse { what, detail: detail.into() }
    }
}
