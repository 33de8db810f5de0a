// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixtures shared by tests across the workspace.

use crate::stat::{CpuStat, HostStat, LoadAvg, LoadStat, NodeStat};
use crate::trigger::{GerritTrigger, SshConfig};

/// A small but complete NodeStat for the given host.
pub fn node_stat(hostname: &str) -> NodeStat {
    NodeStat {
        cpu_stat: CpuStat {
            physical_count: 4,
            logical_count: 8,
            cpu_percents: vec![12.5, 3.0],
            ..Default::default()
        },
        host_stat: HostStat {
            hostname: hostname.to_string(),
            procs: 321,
            os: "linux".into(),
            platform: "ubuntu".into(),
            kernel_arch: "x86_64".into(),
            ..Default::default()
        },
        load_stat: LoadStat {
            load_avg: LoadAvg { load1: 0.5, load5: 0.25, load15: 0.125 },
            ..Default::default()
        },
        ..Default::default()
    }
}

/// [`node_stat`] rendered the way the agent prints it.
pub fn node_stat_json(hostname: &str) -> String {
    serde_json::to_string(&node_stat(hostname)).unwrap_or_default()
}

pub fn gerrit_trigger(change: i64, revision: &str) -> GerritTrigger {
    GerritTrigger {
        project: "platform/build".into(),
        branch: "main".into(),
        change_number: change.to_string(),
        change_owner_email: "owner@example.com".into(),
        patchset_number: "1".into(),
        patchset_revision: revision.into(),
        ..Default::default()
    }
}

pub fn ssh_config(host: &str) -> SshConfig {
    SshConfig {
        host: host.into(),
        port: 22,
        user: "user".into(),
        pass: "pass".into(),
        key: String::new(),
        timeout: "5s".into(),
    }
}
