// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One-shot SSH channel to a worker node.
//!
//! Every [`SshAdapter::run`] opens its own connection and session, runs the
//! joined command list, and tears both down before returning.

use async_trait::async_trait;
use insight_core::{parse_duration, ErrorKind, SshConfig, SshSettings, DEFAULT_SSH_TIMEOUT};
use ssh2::{CheckResult, ExtendedData, KnownHostFileKind, MethodType, Session};
use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Ciphers offered in both directions; modern first, legacy kept for old nodes.
pub const CIPHERS: &[&str] = &[
    "aes128-gcm@openssh.com",
    "aes256-gcm@openssh.com",
    "aes128-ctr",
    "aes192-ctr",
    "aes256-ctr",
    "aes128-cbc",
    "aes192-cbc",
    "aes256-cbc",
    "3des-cbc",
    "arcfour128",
    "arcfour256",
];

pub const KEY_EXCHANGES: &[&str] = &[
    "curve25519-sha256",
    "ecdh-sha2-nistp256",
    "diffie-hellman-group14-sha256",
    "diffie-hellman-group-exchange-sha256",
    "diffie-hellman-group-exchange-sha1",
    "diffie-hellman-group14-sha1",
    "diffie-hellman-group1-sha1",
];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SshError {
    #[error("invalid ssh target: {0}")]
    Config(String),
    #[error("ssh connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },
    #[error("remote command failed: {reason}")]
    Execution { reason: String, output: String },
    #[error("ssh run canceled")]
    Canceled,
}

impl SshError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SshError::Config(_) => ErrorKind::Config,
            SshError::Connection { .. } => ErrorKind::Connection,
            SshError::Execution { .. } => ErrorKind::Execution,
            SshError::Canceled => ErrorKind::Canceled,
        }
    }

    /// Output captured before the failure, if any.
    pub fn output(&self) -> &str {
        match self {
            SshError::Execution { output, .. } => output,
            _ => "",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum SshAuth {
    Password(String),
    Key { path: PathBuf, passphrase: Option<String> },
}

impl std::fmt::Debug for SshAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SshAuth::Password(_) => f.write_str("Password(<redacted>)"),
            SshAuth::Key { path, passphrase } => f
                .debug_struct("Key")
                .field("path", path)
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Resolved connection settings for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub auth: SshAuth,
    /// Bounds dial, handshake and authentication.
    pub timeout: Duration,
    pub strict_host_key: bool,
}

impl SshTarget {
    /// Build a target from a trigger's settings alone.
    pub fn from_config(config: &SshConfig) -> Result<Self, SshError> {
        Self::resolve(config, &SshSettings::default())
    }

    /// Build a target from a trigger's settings, filling blanks from the
    /// configured defaults.
    pub fn resolve(config: &SshConfig, defaults: &SshSettings) -> Result<Self, SshError> {
        fn pick<'a>(first: &'a str, fallback: &'a str) -> &'a str {
            if first.is_empty() {
                fallback
            } else {
                first
            }
        }

        let host = pick(&config.host, &defaults.host);
        if host.is_empty() {
            return Err(SshError::Config("host is empty".into()));
        }
        let port = if config.port != 0 { config.port } else { defaults.port };
        let port = match port {
            0 => 22,
            p => u16::try_from(p)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| SshError::Config(format!("port {} out of range", p)))?,
        };
        let timeout = match pick(&config.timeout, &defaults.timeout) {
            "" => DEFAULT_SSH_TIMEOUT,
            text => parse_duration(text).map_err(|e| SshError::Config(format!("timeout: {}", e)))?,
        };
        let pass = pick(&config.pass, &defaults.pass);
        let key = pick(&config.key, &defaults.key);
        let auth = if key.is_empty() {
            SshAuth::Password(pass.to_string())
        } else {
            SshAuth::Key {
                path: PathBuf::from(key),
                passphrase: (!pass.is_empty()).then(|| pass.to_string()),
            }
        };

        Ok(Self {
            host: host.to_string(),
            port,
            user: pick(&config.user, &defaults.user).to_string(),
            auth,
            timeout,
            strict_host_key: defaults.strict_host_key,
        })
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Adapter for running commands on a remote node
#[async_trait]
pub trait SshAdapter: Clone + Send + Sync + 'static {
    /// Run `commands` joined with ` && ` in one session and return the
    /// merged stdout and stderr.
    async fn run(&self, target: &SshTarget, commands: &[String]) -> Result<String, SshError>;
}

/// Production channel over libssh2.
#[derive(Clone, Debug, Default)]
pub struct Ssh2Adapter {
    known_hosts: Option<PathBuf>,
}

impl Ssh2Adapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Known-hosts file consulted when a target asks for strict checking.
    pub fn with_known_hosts(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts = Some(path.into());
        self
    }
}

#[async_trait]
impl SshAdapter for Ssh2Adapter {
    async fn run(&self, target: &SshTarget, commands: &[String]) -> Result<String, SshError> {
        let target = target.clone();
        let command = commands.join(" && ");
        let known_hosts = self.known_hosts.clone();
        // commands can carry artifact credentials
        tracing::debug!(host = %target.host, port = target.port, commands = commands.len(), "ssh run");

        tokio::task::spawn_blocking(move || run_blocking(&target, &command, known_hosts))
            .await
            .map_err(|e| SshError::Execution { reason: format!("ssh worker failed: {}", e), output: String::new() })?
    }
}

/// Disconnects the session however the run ends.
struct Connected {
    session: Session,
}

impl Drop for Connected {
    fn drop(&mut self) {
        let _ = self.session.disconnect(None, "done", None);
    }
}

fn connect(target: &SshTarget, known_hosts: Option<PathBuf>) -> Result<Connected, SshError> {
    let fail = |reason: String| SshError::Connection { host: target.host.clone(), reason };

    let addr = target
        .address()
        .to_socket_addrs()
        .map_err(|e| fail(format!("resolve: {}", e)))?
        .next()
        .ok_or_else(|| fail("resolve: no addresses".into()))?;
    let tcp = TcpStream::connect_timeout(&addr, target.timeout).map_err(|e| fail(format!("dial: {}", e)))?;

    let mut session = Session::new().map_err(|e| fail(e.to_string()))?;
    let millis = u32::try_from(target.timeout.as_millis()).unwrap_or(u32::MAX);
    session.set_timeout(millis);
    for (method, list) in [
        (MethodType::CryptCs, CIPHERS),
        (MethodType::CryptSc, CIPHERS),
        (MethodType::Kex, KEY_EXCHANGES),
    ] {
        if let Err(e) = session.method_pref(method, &list.join(",")) {
            tracing::warn!(host = %target.host, error = %e, "ssh method preference rejected");
        }
    }
    session.set_tcp_stream(tcp);
    session.handshake().map_err(|e| fail(format!("handshake: {}", e)))?;
    let connected = Connected { session };

    if target.strict_host_key {
        verify_host_key(&connected.session, target, known_hosts).map_err(fail)?;
    }

    match &target.auth {
        SshAuth::Password(pass) => connected.session.userauth_password(&target.user, pass),
        SshAuth::Key { path, passphrase } => {
            connected.session.userauth_pubkey_file(&target.user, None, path, passphrase.as_deref())
        }
    }
    .map_err(|e| fail(format!("auth: {}", e)))?;
    if !connected.session.authenticated() {
        return Err(fail("auth: rejected".into()));
    }

    // The dial budget does not apply to the remote command itself.
    connected.session.set_timeout(0);
    Ok(connected)
}

fn verify_host_key(session: &Session, target: &SshTarget, known_hosts: Option<PathBuf>) -> Result<(), String> {
    let path = known_hosts
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".ssh/known_hosts")))
        .ok_or_else(|| "no known_hosts file".to_string())?;
    let mut hosts = session.known_hosts().map_err(|e| e.to_string())?;
    hosts
        .read_file(&path, KnownHostFileKind::OpenSSH)
        .map_err(|e| format!("{}: {}", path.display(), e))?;
    let (key, _) = session.host_key().ok_or_else(|| "server sent no host key".to_string())?;
    match hosts.check_port(&target.host, target.port, key) {
        CheckResult::Match => Ok(()),
        CheckResult::NotFound => Err("host key not in known_hosts".into()),
        CheckResult::Mismatch => Err("host key mismatch".into()),
        CheckResult::Failure => Err("host key check failed".into()),
    }
}

fn run_blocking(target: &SshTarget, command: &str, known_hosts: Option<PathBuf>) -> Result<String, SshError> {
    let connected = connect(target, known_hosts)?;
    let fail = |reason: String| SshError::Connection { host: target.host.clone(), reason };

    let mut channel = connected.session.channel_session().map_err(|e| fail(format!("session: {}", e)))?;
    channel
        .handle_extended_data(ExtendedData::Merge)
        .map_err(|e| fail(format!("session: {}", e)))?;
    channel.exec(command).map_err(|e| fail(format!("exec: {}", e)))?;

    let mut raw = Vec::new();
    let read = channel.read_to_end(&mut raw);
    let output = String::from_utf8_lossy(&raw).into_owned();
    read.map_err(|e| SshError::Execution { reason: format!("read: {}", e), output: output.clone() })?;

    let _ = channel.send_eof();
    channel
        .wait_close()
        .map_err(|e| SshError::Execution { reason: format!("close: {}", e), output: output.clone() })?;
    let status = channel
        .exit_status()
        .map_err(|e| SshError::Execution { reason: format!("exit status: {}", e), output: output.clone() })?;

    if status != 0 {
        tracing::debug!(host = %target.host, status, "remote command exited non-zero");
        return Err(SshError::Execution { reason: format!("exit status {}", status), output });
    }
    Ok(output)
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{SshAdapter, SshError, SshTarget};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded run
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SshCall {
        pub host: String,
        pub commands: Vec<String>,
    }

    impl SshCall {
        pub fn joined(&self) -> String {
            self.commands.join(" && ")
        }
    }

    struct Rule {
        needle: String,
        result: Result<String, SshError>,
        delay: Option<Duration>,
    }

    #[derive(Default)]
    struct FakeSshState {
        rules: Vec<Rule>,
        calls: Vec<SshCall>,
    }

    /// Fake SSH channel. The first rule whose needle appears in the joined
    /// command answers; unmatched runs succeed with empty output.
    #[derive(Clone, Default)]
    pub struct FakeSshAdapter {
        inner: Arc<Mutex<FakeSshState>>,
    }

    impl FakeSshAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_command(&self, needle: impl Into<String>, output: impl Into<String>) -> &Self {
            self.push(needle.into(), Ok(output.into()), None)
        }

        pub fn fail_command(&self, needle: impl Into<String>, error: SshError) -> &Self {
            self.push(needle.into(), Err(error), None)
        }

        /// Answer after sleeping, to exercise cancellation.
        pub fn slow_command(&self, needle: impl Into<String>, output: impl Into<String>, delay: Duration) -> &Self {
            self.push(needle.into(), Ok(output.into()), Some(delay))
        }

        fn push(&self, needle: String, result: Result<String, SshError>, delay: Option<Duration>) -> &Self {
            self.inner.lock().rules.push(Rule { needle, result, delay });
            self
        }

        /// Get all recorded runs
        pub fn calls(&self) -> Vec<SshCall> {
            self.inner.lock().calls.clone()
        }

        /// Runs whose joined command contains `needle`
        pub fn calls_matching(&self, needle: &str) -> Vec<SshCall> {
            self.calls().into_iter().filter(|c| c.joined().contains(needle)).collect()
        }
    }

    #[async_trait]
    impl SshAdapter for FakeSshAdapter {
        async fn run(&self, target: &SshTarget, commands: &[String]) -> Result<String, SshError> {
            let (result, delay) = {
                let mut inner = self.inner.lock();
                let call = SshCall { host: target.host.clone(), commands: commands.to_vec() };
                let joined = call.joined();
                inner.calls.push(call);
                match inner.rules.iter().find(|r| joined.contains(r.needle.as_str())) {
                    Some(rule) => (rule.result.clone(), rule.delay),
                    None => (Ok(String::new()), None),
                }
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            result
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSshAdapter, SshCall};

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
