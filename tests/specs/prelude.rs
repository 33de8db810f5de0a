// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers: locate the workspace binaries, run them, and assert on
//! their output.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

pub use similar_asserts::assert_eq;

/// Path to a workspace binary, building its package on first use when the
/// test run did not already produce it.
fn binary(package: &str, name: &str) -> PathBuf {
    static BUILD: Mutex<()> = Mutex::new(());
    let path = assert_cmd::cargo::cargo_bin(name);
    if path.exists() {
        return path;
    }
    let _guard = BUILD.lock().unwrap();
    let status = std::process::Command::new(env!("CARGO"))
        .args(["build", "--quiet", "-p", package, "--bin", name])
        .status()
        .expect("cargo build runs");
    assert!(status.success(), "failed to build {}", name);
    path
}

fn insight_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| binary("insight", "insight"))
}

fn agent_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| binary("insight-agent", "agent"))
}

/// The `insight` CLI.
pub fn cli() -> Cli {
    Cli::new(insight_path())
}

/// The remote `agent` collector, run locally.
pub fn agent() -> Cli {
    Cli::new(agent_path())
}

pub struct Cli {
    cmd: assert_cmd::Command,
}

impl Cli {
    fn new(path: &Path) -> Self {
        let mut cmd = assert_cmd::Command::new(path);
        cmd.env_remove("RUST_LOG");
        Self { cmd }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.cmd.write_stdin(input);
        self
    }

    pub fn passes(mut self) -> Output {
        Output::from(self.cmd.assert().success().get_output())
    }

    pub fn exits(mut self, code: i32) -> Output {
        Output::from(self.cmd.assert().code(code).get_output())
    }
}

pub struct Output {
    pub stdout: String,
    pub stderr: String,
}

impl From<&std::process::Output> for Output {
    fn from(output: &std::process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl Output {
    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout lacks {:?}:\n{}", needle, self.stdout);
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr lacks {:?}:\n{}", needle, self.stderr);
        self
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|e| panic!("stdout is not JSON ({}):\n{}", e, self.stdout))
    }
}

/// A scratch directory holding a config file.
pub struct Project {
    dir: tempfile::TempDir,
}

pub const MINIMAL_CONFIG: &str = "\
apiVersion: insight/v1
kind: insight
metadata:
  name: specs
";

impl Project {
    pub fn with_config(yaml: &str) -> Self {
        let project = Self { dir: tempfile::tempdir().unwrap() };
        project.file("insight.yml", yaml);
        project
    }

    pub fn file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    pub fn config(&self) -> String {
        self.dir.path().join("insight.yml").display().to_string()
    }
}
