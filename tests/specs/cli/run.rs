// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running trigger requests end to end without network access.

use crate::prelude::*;
use crate::prelude::assert_eq;

#[test]
fn missing_config_exits_with_config_code() {
    cli()
        .args(&["--config-file", "/nonexistent/insight.yml"])
        .exits(2)
        .stderr_has("error: failed to read config");
}

#[test]
fn invalid_config_exits_with_config_code() {
    let project = Project::with_config("apiVersion: insight/v1\n");
    cli().args(&["--config-file", &project.config()]).exits(2).stderr_has("error: missing required field: kind");
}

#[test]
fn malformed_duration_is_a_config_error() {
    let project = Project::with_config(&format!("{}spec:\n  nodeConfig:\n    duration: soon\n", MINIMAL_CONFIG));
    cli().args(&["--config-file", &project.config()]).exits(2).stderr_has("spec.nodeConfig.duration");
}

#[test]
fn no_trigger_prints_an_empty_response() {
    let project = Project::with_config(MINIMAL_CONFIG);
    let output = cli().args(&["--config-file", &project.config()]).passes();
    assert_eq!(
        output.json(),
        serde_json::json!({"buildInfo": null, "codeInfo": null, "nodeInfo": null, "mailInfo": null})
    );
}

#[test]
fn build_log_is_analyzed_from_stdin() {
    let project = Project::with_config(MINIMAL_CONFIG);
    let trigger = serde_json::json!({
        "buildTrigger": {
            "loggingTrigger": {"lines": ["make all", "src/a.c:12:5: error: expected ';'", "make: *** failed"]},
            "gerritTrigger": {"project": "platform/build", "changeOwnerEmail": "owner@example.com"}
        },
        "codeTrigger": {}
    });

    let output = cli()
        .args(&["--config-file", &project.config(), "--trigger-file", "-"])
        .stdin(trigger.to_string())
        .passes();

    let response = output.json();
    let logging = &response["buildInfo"]["loggingInfo"];
    assert_eq!(logging["file"], "src/a.c");
    assert_eq!(logging["line"], 12);
    assert_eq!(logging["type"], "error");
    assert_eq!(response["codeInfo"]["vote"], "");
    assert_eq!(response["mailInfo"]["to"], serde_json::json!(["owner@example.com"]));
    assert!(response["nodeInfo"].is_null());
}

#[test]
fn trigger_file_is_read_from_disk() {
    let project = Project::with_config(MINIMAL_CONFIG);
    let trigger = project.file("trigger.json", r#"{"codeTrigger":{}}"#);

    let output = cli()
        .args(&["--config-file", &project.config(), "--trigger-file", &trigger.display().to_string()])
        .passes();

    assert!(output.json()["codeInfo"].is_object());
}

#[test]
fn malformed_trigger_exits_with_failure() {
    let project = Project::with_config(MINIMAL_CONFIG);
    cli()
        .args(&["--config-file", &project.config(), "--trigger-file", "-"])
        .stdin("{not json")
        .exits(1)
        .stderr_has("error: failed to parse trigger request");
}

#[test]
fn logs_stay_off_stdout() {
    let project = Project::with_config(MINIMAL_CONFIG);
    let output = cli().args(&["--config-file", &project.config(), "--log-level", "DEBUG"]).passes();
    assert!(output.stderr.contains("config loaded"));
    output.json();
}
