// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use insight_adapters::{FakeGptAdapter, FakeSshAdapter, NoopGptAdapter, SshError};
use insight_core::test_support::{node_stat_json, ssh_config};
use insight_core::ErrorKind;
use parking_lot::Mutex;
use std::sync::Arc;

const DETECT: &str = "bash agent.sh";
const HEALTH: &str = "healthcheck.sh --silent";
const STAT: &str = "--duration-time";
const CLEAN: &str = "rm -f /tmp/agent.sh";

fn artifact() -> ArtifactConfig {
    ArtifactConfig { url: "http://artifacts/".into(), user: "art".into(), pass: "secret".into() }
}

fn trigger(host: &str) -> NodeTrigger {
    NodeTrigger { ssh_config: ssh_config(host) }
}

fn happy_ssh() -> FakeSshAdapter {
    let ssh = FakeSshAdapter::new();
    ssh.on_command(HEALTH, "OK").on_command(STAT, node_stat_json("test-host"));
    ssh
}

#[tokio::test]
async fn happy_path_fills_stat_and_report() {
    let ssh = happy_ssh();
    let gpt = FakeGptAdapter::replying("facet");
    gpt.on_prompt("health:\nOK", "ok-report");
    let sight = NodeSight::new(ssh.clone(), gpt, artifact());

    let outcome = sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    assert!(outcome.error.is_none(), "{:?}", outcome.error);
    assert_eq!(outcome.info.node_stat.host_stat.hostname, "test-host");
    assert_eq!(outcome.info.node_report.health_report, "ok-report");
    assert_eq!(outcome.info.node_report.cpu_report, "facet");
    assert!(outcome.info.error.is_none());
    assert!(outcome.mail.is_none());
}

#[tokio::test]
async fn steps_run_in_order_with_pinned_commands() {
    let ssh = happy_ssh();
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact()).duration(Duration::from_secs(90));
    sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    let calls = ssh.calls();
    assert_eq!(calls.len(), 4);
    assert!(calls.iter().all(|c| c.host == "test-host"));
    assert_eq!(
        calls[0].commands,
        vec![
            "curl -s -uart:secret -L http://artifacts/devops-pipeflow/plugins/agent.sh -o /tmp/agent.sh".to_string(),
            "cd /tmp; bash agent.sh art secret http://artifacts/devops-pipeflow/plugins/agent /tmp/agent".to_string(),
        ]
    );
    assert_eq!(
        calls[1].commands,
        vec![
            "curl -s -uart:secret -L http://artifacts/devops-pipeflow/plugins/healthcheck.sh -o /tmp/healthcheck.sh"
                .to_string(),
            "cd /tmp; bash healthcheck.sh --silent".to_string(),
        ]
    );
    assert_eq!(calls[2].commands, vec!["/tmp/agent --duration-time=1m30s --log-level=ERROR".to_string()]);
    assert_eq!(calls[3].commands, vec!["rm -f /tmp/agent.sh".to_string(), "rm -f /tmp/healthcheck.sh".to_string()]);
}

#[yare::parameterized(
    detect = { DETECT, ErrorKind::Connection, "detect failed" },
    health = { HEALTH, ErrorKind::Connection, "health failed" },
    stat = { STAT, ErrorKind::Connection, "stat failed" },
)]
#[test_macro(tokio::test)]
async fn clean_runs_once_whichever_step_fails(needle: &str, kind: ErrorKind, prefix: &str) {
    let ssh = FakeSshAdapter::new();
    ssh.fail_command(needle, SshError::Connection { host: "test-host".into(), reason: "reset".into() })
        .on_command(HEALTH, "OK")
        .on_command(STAT, node_stat_json("test-host"));
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact());

    let outcome = sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    let error = outcome.error.unwrap();
    assert_eq!(error.kind(), kind);
    assert!(outcome.info.error.unwrap().starts_with(prefix));
    assert_eq!(ssh.calls_matching(CLEAN).len(), 1);
    assert_eq!(ssh.calls().last().unwrap().joined(), "rm -f /tmp/agent.sh && rm -f /tmp/healthcheck.sh");
}

#[tokio::test]
async fn failed_detect_skips_later_steps() {
    let ssh = FakeSshAdapter::new();
    ssh.on_command(DETECT, "curl: (22) The requested URL returned error: 404\n");
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact());

    let outcome = sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    assert!(matches!(outcome.error, Some(SightError::DetectOutput(_))));
    assert!(ssh.calls_matching(HEALTH).is_empty());
    assert!(ssh.calls_matching(STAT).is_empty());
    assert_eq!(ssh.calls_matching(CLEAN).len(), 1);
}

#[yare::parameterized(
    empty = { "", ErrorKind::Decode },
    whitespace = { "  \n", ErrorKind::Decode },
    garbage = { "panic: runtime error", ErrorKind::Decode },
    truncated = { "{\"hostStat\": {", ErrorKind::Decode },
    wrong_shape = { "{\"hostStat\": {\"procs\": \"many\"}}", ErrorKind::Parse },
)]
fn agent_output_failures(output: &str, kind: ErrorKind) {
    assert_eq!(parse_stat(output).unwrap_err().kind(), kind);
}

#[test]
fn agent_output_tolerates_missing_sections() {
    let stat = parse_stat("{\"hostStat\": {\"hostname\": \"n1\"}}\n").unwrap();
    assert_eq!(stat.host_stat.hostname, "n1");
    assert_eq!(stat.cpu_stat, Default::default());
}

#[tokio::test]
async fn empty_agent_output_keeps_health_but_fails() {
    let ssh = FakeSshAdapter::new();
    ssh.on_command(HEALTH, "OK");
    let sight = NodeSight::new(ssh.clone(), FakeGptAdapter::replying("x"), artifact());

    let outcome = sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    assert!(matches!(outcome.error, Some(SightError::StatDecode(_))));
    assert_eq!(outcome.info.node_report, Default::default());
    assert_eq!(ssh.calls_matching(CLEAN).len(), 1);
}

#[tokio::test]
async fn gpt_failures_do_not_fail_the_sight() {
    // no reply scripted: every facet request errors
    let sight = NodeSight::new(happy_ssh(), FakeGptAdapter::new(), artifact());
    let outcome = sight.run(&trigger("test-host"), &CancellationToken::new()).await;

    assert!(outcome.error.is_none());
    assert_eq!(outcome.info.node_stat.host_stat.hostname, "test-host");
    assert_eq!(outcome.info.node_report, Default::default());
}

#[tokio::test]
async fn cancellation_interrupts_stat_and_still_cleans() {
    let ssh = FakeSshAdapter::new();
    ssh.slow_command(STAT, node_stat_json("test-host"), Duration::from_secs(30));
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact());
    let cancel = CancellationToken::new();
    let trigger_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger_cancel.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = sight.run(&trigger("test-host"), &cancel).await;

    assert!(outcome.error.unwrap().is_canceled());
    assert_eq!(outcome.info.error.as_deref(), Some("canceled"));
    assert_eq!(ssh.calls_matching(CLEAN).len(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn cancellation_interrupts_report_and_still_cleans() {
    let gpt = FakeGptAdapter::replying("facet");
    gpt.delayed(Duration::from_secs(30));
    let ssh = happy_ssh();
    let sight = NodeSight::new(ssh.clone(), gpt, artifact());
    let cancel = CancellationToken::new();
    let trigger_cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger_cancel.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = sight.run(&trigger("test-host"), &cancel).await;

    assert!(outcome.error.unwrap().is_canceled());
    assert_eq!(ssh.calls_matching(CLEAN).len(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn unresolvable_target_never_connects() {
    let ssh = FakeSshAdapter::new();
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact());

    let outcome = sight.run(&trigger(""), &CancellationToken::new()).await;

    assert_eq!(outcome.error.unwrap().kind(), ErrorKind::Config);
    assert_eq!(outcome.info.error.as_deref(), Some("invalid ssh target: host is empty"));
    assert!(ssh.calls().is_empty());
}

#[tokio::test]
async fn blank_trigger_fields_use_configured_defaults() {
    let ssh = happy_ssh();
    let defaults = SshSettings { host: "fallback".into(), user: "ops".into(), ..Default::default() };
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact()).defaults(defaults);

    let outcome = sight.run(&NodeTrigger::default(), &CancellationToken::new()).await;

    assert!(outcome.error.is_none());
    assert!(ssh.calls().iter().all(|c| c.host == "fallback"));
}

#[test]
fn config_supplies_duration_and_artifacts() {
    let mut config = Config::default();
    config.spec.node_config.duration = "30s".into();
    config.spec.artifact_config = artifact();
    let sight = NodeSight::from_config(FakeSshAdapter::new(), NoopGptAdapter, &config).unwrap();
    assert_eq!(sight.duration, Duration::from_secs(30));
    assert_eq!(sight.artifact_url("agent"), "http://artifacts/devops-pipeflow/plugins/agent");

    config.spec.node_config.duration = "soon".into();
    assert!(NodeSight::from_config(FakeSshAdapter::new(), NoopGptAdapter, &config).is_err());
}

/// Panics on the stat step and records every run.
#[derive(Clone, Default)]
struct PanickingSsh {
    runs: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SshAdapter for PanickingSsh {
    async fn run(&self, _target: &SshTarget, commands: &[String]) -> Result<String, SshError> {
        let joined = commands.join(" && ");
        self.runs.lock().push(joined.clone());
        if joined.contains(STAT) {
            panic!("agent crashed the channel");
        }
        Ok(String::new())
    }
}

#[tokio::test]
async fn clean_runs_when_a_step_panics() {
    let ssh = PanickingSsh::default();
    let sight = NodeSight::new(ssh.clone(), NoopGptAdapter, artifact());

    let joined = tokio::spawn(async move { sight.run(&trigger("test-host"), &CancellationToken::new()).await }).await;

    assert!(joined.unwrap_err().is_panic());
    let runs = ssh.runs.lock().clone();
    assert_eq!(runs.iter().filter(|r| r.contains(CLEAN)).count(), 1);
    assert!(runs.last().unwrap().contains(CLEAN));
}
