// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help and version output.

use crate::prelude::*;

#[test]
fn help_lists_flags() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("--config-file")
        .stdout_has("--trigger-file")
        .stdout_has("--log-level");
}

#[test]
fn version_shows_package_version() {
    cli().args(&["--version"]).passes().stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn config_file_is_required() {
    cli().exits(2).stderr_has("--config-file");
}

#[test]
fn unknown_log_level_is_a_usage_error() {
    cli().args(&["--config-file", "x.yml", "--log-level", "LOUD"]).exits(2);
}
