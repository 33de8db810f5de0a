// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn config_errors_exit_with_config_code() {
    let exit = ExitError::from(ConfigError::Missing("kind"));
    assert_eq!(exit.code, EXIT_CONFIG);
    assert_eq!(exit.message, "missing required field: kind");
}

#[test]
fn unreadable_config_is_a_config_exit() {
    let err = insight_core::Config::load(std::path::Path::new("/nonexistent/insight.yml")).unwrap_err();
    assert_eq!(ExitError::from(err).code, EXIT_CONFIG);
}

#[test]
fn exit_errors_survive_anyhow() {
    let err = anyhow::Error::new(ExitError::new(EXIT_CONFIG, "bad config"));
    let exit = ExitError::from_anyhow(&err);
    assert_eq!(exit.code, EXIT_CONFIG);
    assert_eq!(exit.message, "bad config");
}

#[test]
fn other_errors_exit_with_failure_and_full_chain() {
    let err = anyhow::anyhow!("root cause").context("reading trigger");
    let exit = ExitError::from_anyhow(&err);
    assert_eq!(exit.code, EXIT_FAILURE);
    assert_eq!(exit.message, "reading trigger: root cause");
}
