// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent prints one NodeStat document and exits 0.

use crate::prelude::*;

const SECTIONS: [&str; 8] =
    ["cpuStat", "diskStat", "dockerStat", "hostStat", "loadStat", "memStat", "netStat", "processStat"];

#[test]
fn snapshot_has_every_section() {
    let output = agent().args(&["--duration-time=200ms", "--log-level=ERROR"]).passes();
    let stat = output.json();
    for section in SECTIONS {
        assert!(stat[section].is_object(), "missing {}", section);
    }
    assert!(stat["cpuStat"]["logicalCount"].as_u64().unwrap() > 0);
}

#[test]
fn duration_is_required() {
    agent().exits(2).stderr_has("--duration-time");
}

#[test]
fn malformed_duration_is_rejected() {
    agent().args(&["--duration-time=soon"]).exits(2).stderr_has("invalid number in duration");
}
