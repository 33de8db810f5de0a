// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every crate.
//!
//! Each crate keeps its own `thiserror` enum; `kind()` on those enums maps
//! a concrete failure onto one of these categories so callers can branch
//! without matching on every variant.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed YAML, missing required field, bad duration
    Config,
    /// Local filesystem
    Io,
    /// Transport error or non-200 status
    Http,
    /// JSON/XML/diff parse failure, including a missing XSSI prefix
    Decode,
    /// SSH dial, auth, or session open
    Connection,
    /// Non-zero remote exit or unexpected output
    Execution,
    /// Agent JSON does not match the NodeStat schema
    Parse,
    /// Deadline exceeded or explicit cancel
    Canceled,
}

crate::simple_display! {
    ErrorKind {
        Config => "config",
        Io => "io",
        Http => "http",
        Decode => "decode",
        Connection => "connection",
        Execution => "execution",
        Parse => "parse",
        Canceled => "canceled",
    }
}
