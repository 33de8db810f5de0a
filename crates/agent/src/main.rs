// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! agent: one-shot node statistics collector.
//!
//! Prints a single NodeStat JSON document on stdout and exits. Logs go to
//! stderr so the document stays parseable.

mod collect;
mod docker;
mod error;
mod procfs;
mod system;

use clap::Parser;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "agent", version, about = "Collect one node statistics snapshot as JSON")]
struct Args {
    /// Sampling window for CPU usage (e.g. 10s, 1m30s)
    #[arg(long = "duration-time", value_parser = insight_core::parse_duration)]
    duration_time: Duration,

    /// Log level written to stderr (DEBUG, INFO, WARN, ERROR)
    #[arg(long = "log-level", default_value = "INFO")]
    log_level: Level,
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

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_level);

    let stat = collect::Collector::default().collect(args.duration_time).await;
    match serde_json::to_string(&stat) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "cannot encode snapshot");
            ExitCode::FAILURE
        }
    }
}
