// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One snapshot: sample for the requested window, then read every section.

use crate::docker::DockerCollector;
use crate::error::CollectError;
use crate::system::{self, Roots};
use insight_core::NodeStat;
use std::time::Duration;
use sysinfo::{System, SystemExt};

/// Sections that fail are logged and left at their defaults.
fn section<T: Default>(name: &'static str, result: Result<T, CollectError>) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!(section = name, error = %e, "collector failed");
        T::default()
    })
}

#[derive(Default)]
pub struct Collector {
    roots: Roots,
    docker: DockerCollector,
}

impl Collector {
    insight_core::setters! {
        set { roots: Roots, docker: DockerCollector }
    }

    /// CPU and process percentages are averaged over `window`.
    pub async fn collect(&self, window: Duration) -> NodeStat {
        let mut sys = System::new_all();
        sys.refresh_users_list();
        let window = window.max(System::MINIMUM_CPU_UPDATE_INTERVAL);
        tracing::debug!(window_ms = window.as_millis() as u64, "sampling");
        tokio::time::sleep(window).await;
        sys.refresh_cpu();
        sys.refresh_processes();
        sys.refresh_networks();

        let docker_stat = section("docker", self.docker.collect().await);
        let roots = &self.roots;
        let stat = NodeStat {
            cpu_stat: section("cpu", system::cpu(&sys, roots)),
            disk_stat: section("disk", system::disk(&sys, roots)),
            docker_stat,
            host_stat: section("host", system::host(&sys, roots)),
            load_stat: section("load", system::load(&sys, roots)),
            mem_stat: section("mem", system::mem(&sys, roots)),
            net_stat: section("net", system::net(&sys, roots)),
            process_stat: section("process", system::process(&sys, roots)),
        };
        tracing::info!(processes = stat.process_stat.process_infos.len(), "snapshot collected");
        stat
    }
}

#[cfg(test)]
#[path = "collect_tests.rs"]
mod tests;
