// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type that carries a process exit code.
//!
//! `run` returns `ExitError` instead of calling `std::process::exit()`
//! directly, so `main()` owns process termination.

use insight_core::ConfigError;
use std::fmt;
use std::process::ExitCode;

/// Anything that is not a config problem.
pub const EXIT_FAILURE: u8 = 1;
/// The config file is missing, unreadable or invalid.
pub const EXIT_CONFIG: u8 = 2;

#[derive(Debug)]
pub struct ExitError {
    pub code: u8,
    pub message: String,
}

impl ExitError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    /// Recover the exit code from an `anyhow` chain, defaulting to failure.
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ExitError>() {
            Some(exit) => Self::new(exit.code, exit.message.clone()),
            None => Self::new(EXIT_FAILURE, format!("{:#}", err)),
        }
    }

    /// Print `error: <message>` to stderr and hand back the exit code.
    pub fn report(&self) -> ExitCode {
        eprintln!("error: {}", self.message);
        ExitCode::from(self.code)
    }
}

impl From<ConfigError> for ExitError {
    fn from(err: ConfigError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
