// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insight: run one trigger request through the build, code and node
//! sights and print the response.

mod exit_error;
mod request;

use anyhow::Context;
use clap::Parser;
use exit_error::{ExitError, EXIT_FAILURE};
use insight_adapters::{HttpGptAdapter, Ssh2Adapter};
use insight_core::Config;
use insight_engine::Insight;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[command(name = "insight", version = VERSION, about = "Build, code and node insight for CI/CD triggers")]
struct Cli {
    /// YAML config file
    #[arg(long = "config-file")]
    config_file: PathBuf,

    /// Log level written to stderr (DEBUG, INFO, WARN, ERROR)
    #[arg(long = "log-level", default_value = "INFO")]
    log_level: Level,

    /// JSON trigger request; `-` reads stdin
    #[arg(long = "trigger-file")]
    trigger_file: Option<PathBuf>,
}

/// `RUST_LOG` wins over `--log-level` when set.
fn init_tracing(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_ansi(false))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(&cli.config_file).map_err(ExitError::from)?;
    tracing::info!(config = %cli.config_file.display(), name = %config.metadata.name, "config loaded");
    let request = request::read_request(cli.trigger_file.as_deref())?;

    let insight = Insight::from_config(
        Ssh2Adapter::new(),
        HttpGptAdapter::from_config(&config.spec.gpt_config),
        &config,
    )
    .map_err(ExitError::from)?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, canceling");
            interrupt.cancel();
        }
    });

    let dispatch = insight.run(&request, &cancel).await;
    let json = serde_json::to_string(&dispatch.response).context("failed to encode response")?;
    println!("{}", json);

    match dispatch.error {
        Some(error) => Err(ExitError::new(EXIT_FAILURE, error.to_string()).into()),
        None => Ok(()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ExitError::from_anyhow(&err).report(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[test]
    fn config_file_is_required() {
        assert!(Cli::try_parse_from(["insight"]).is_err());
    }

    #[parameterized(
        defaults = { &["insight", "--config-file", "c.yml"], Level::INFO, None },
        stdin = { &["insight", "--config-file=c.yml", "--trigger-file", "-"], Level::INFO, Some("-") },
        quiet = { &["insight", "--config-file=c.yml", "--log-level", "error"], Level::ERROR, None },
    )]
    fn parses_flags(argv: &[&str], level: Level, trigger: Option<&str>) {
        let cli = Cli::try_parse_from(argv).unwrap();
        assert_eq!(cli.config_file, PathBuf::from("c.yml"));
        assert_eq!(cli.log_level, level);
        assert_eq!(cli.trigger_file, trigger.map(PathBuf::from));
    }

    #[tokio::test]
    async fn invalid_config_exits_with_config_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insight.yml");
        std::fs::write(&path, "apiVersion: v1\n").unwrap();
        let cli = Cli { config_file: path, log_level: Level::INFO, trigger_file: None };

        let err = run(&cli).await.unwrap_err();

        let exit = ExitError::from_anyhow(&err);
        assert_eq!(exit.code, exit_error::EXIT_CONFIG);
        assert_eq!(exit.message, "missing required field: kind");
    }

    #[tokio::test]
    async fn empty_request_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("insight.yml");
        std::fs::write(&path, "apiVersion: v1\nkind: insight\nmetadata:\n  name: test\n").unwrap();
        let cli = Cli { config_file: path, log_level: Level::INFO, trigger_file: None };

        run(&cli).await.unwrap();
    }
}
