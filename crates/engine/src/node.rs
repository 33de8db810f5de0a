// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NodeSight: deploy the agent over SSH, sample the node, describe it.
//!
//! ```text
//! Detect -> Health -> Stat -> Report -> Clean
//! ```
//!
//! The first failing step aborts the rest. Clean runs exactly once on every
//! exit path once a target resolved, including cancellation and panics.

use crate::error::SightError;
use crate::report::ReportComposer;
use crate::sight::{guarded, Outcome, Sight};
use async_trait::async_trait;
use futures::FutureExt;
use insight_adapters::{GptAdapter, SshAdapter, SshTarget};
use insight_core::{
    format_duration, ArtifactConfig, Config, ConfigError, NodeInfo, NodeStat, NodeTrigger,
    SshSettings, DEFAULT_NODE_DURATION,
};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Directory on the artifact server holding the bootstrap payloads.
pub const ARTIFACT_PATH: &str = "devops-pipeflow/plugins";

pub const AGENT_SCRIPT: &str = "/tmp/agent.sh";
pub const HEALTH_SCRIPT: &str = "/tmp/healthcheck.sh";
pub const AGENT_BINARY: &str = "/tmp/agent";

pub struct NodeSight<S: SshAdapter, G: GptAdapter> {
    ssh: S,
    composer: ReportComposer<G>,
    artifact: ArtifactConfig,
    defaults: SshSettings,
    duration: Duration,
}

impl<S: SshAdapter, G: GptAdapter> NodeSight<S, G> {
    pub fn new(ssh: S, gpt: G, artifact: ArtifactConfig) -> Self {
        Self {
            ssh,
            composer: ReportComposer::new(gpt),
            artifact,
            defaults: SshSettings::default(),
            duration: DEFAULT_NODE_DURATION,
        }
    }

    pub fn from_config(ssh: S, gpt: G, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(ssh, gpt, config.spec.artifact_config.clone())
            .defaults(config.spec.ssh_config.clone())
            .duration(config.node_duration()?))
    }

    insight_core::setters! {
        set { defaults: SshSettings, duration: Duration }
    }

    fn artifact_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.artifact.url.trim_end_matches('/'), ARTIFACT_PATH, name)
    }

    fn download(&self, name: &str, to: &str) -> String {
        format!("curl -s -u{}:{} -L {} -o {}", self.artifact.user, self.artifact.pass, self.artifact_url(name), to)
    }

    /// Download the bootstrap script and let it install the agent binary.
    /// The bootstrap is silent on success.
    async fn detect(&self, target: &SshTarget) -> Result<(), SightError> {
        let commands = vec![
            self.download("agent.sh", AGENT_SCRIPT),
            format!(
                "cd /tmp; bash agent.sh {} {} {} {}",
                self.artifact.user,
                self.artifact.pass,
                self.artifact_url("agent"),
                AGENT_BINARY
            ),
        ];
        let output = self.ssh.run(target, &commands).await.map_err(SightError::Detect)?;
        let output = output.trim();
        if !output.is_empty() {
            return Err(SightError::DetectOutput(output.to_string()));
        }
        Ok(())
    }

    async fn health(&self, target: &SshTarget) -> Result<String, SightError> {
        let commands =
            vec![self.download("healthcheck.sh", HEALTH_SCRIPT), "cd /tmp; bash healthcheck.sh --silent".to_string()];
        self.ssh.run(target, &commands).await.map_err(SightError::Health)
    }

    async fn stat(&self, target: &SshTarget) -> Result<NodeStat, SightError> {
        let command = format!("{} --duration-time={} --log-level=ERROR", AGENT_BINARY, format_duration(self.duration));
        let output = self.ssh.run(target, &[command]).await.map_err(SightError::Stat)?;
        parse_stat(&output)
    }

    /// Best-effort removal of the downloaded scripts.
    async fn clean(&self, target: &SshTarget) {
        let commands = vec![format!("rm -f {}", AGENT_SCRIPT), format!("rm -f {}", HEALTH_SCRIPT)];
        if let Err(e) = self.ssh.run(target, &commands).await {
            tracing::warn!(host = %target.host, error = %e, "clean failed");
        }
    }

    async fn steps(&self, target: &SshTarget, info: &mut NodeInfo, cancel: &CancellationToken) -> Result<(), SightError> {
        guarded(cancel, self.detect(target)).await?;
        tracing::debug!(host = %target.host, "agent deployed");

        let health = guarded(cancel, self.health(target)).await?;
        info.node_stat = guarded(cancel, self.stat(target)).await?;
        tracing::debug!(host = %target.host, "node sampled");

        info.node_report = self.composer.compose(&health, &info.node_stat, cancel).await?;
        Ok(())
    }
}

/// Decode the agent's stdout. Malformed JSON is a decode failure; JSON of
/// the wrong shape is a parse failure.
pub fn parse_stat(output: &str) -> Result<NodeStat, SightError> {
    let output = output.trim();
    if output.is_empty() {
        return Err(SightError::StatDecode("agent printed nothing".into()));
    }
    serde_json::from_str(output).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => SightError::StatParse(e.to_string()),
        _ => SightError::StatDecode(e.to_string()),
    })
}

#[async_trait]
impl<S: SshAdapter, G: GptAdapter> Sight for NodeSight<S, G> {
    type Trigger = NodeTrigger;
    type Info = NodeInfo;

    fn name(&self) -> &'static str {
        "node"
    }

    async fn run(&self, trigger: &NodeTrigger, cancel: &CancellationToken) -> Outcome<NodeInfo> {
        let target = match SshTarget::resolve(&trigger.ssh_config, &self.defaults) {
            Ok(target) => target,
            Err(e) => {
                let error = SightError::Target(e);
                let info = NodeInfo { error: Some(error.to_string()), ..Default::default() };
                return Outcome::failed(info, error);
            }
        };
        tracing::info!(host = %target.host, port = target.port, "node sight started");

        let mut info = NodeInfo::default();
        let result = AssertUnwindSafe(self.steps(&target, &mut info, cancel)).catch_unwind().await;
        self.clean(&target).await;

        match result {
            Ok(Ok(())) => {
                tracing::info!(host = %target.host, "node sight finished");
                Outcome::ok(info)
            }
            Ok(Err(error)) => {
                tracing::warn!(host = %target.host, error = %error, "node sight failed");
                info.error = Some(error.to_string());
                Outcome::failed(info, error)
            }
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
