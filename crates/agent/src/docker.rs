// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container inventory from the docker CLI, usage from cgroup files.

use crate::error::CollectError;
use crate::procfs::read;
use insight_adapters::subprocess::{combined_output, run_with_timeout, TOOL_TIMEOUT};
use insight_core::stat::{CgroupDockerStat, CgroupMemDocker, DockerStat};
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const CGROUP_ROOT: &str = "/sys/fs/cgroup";

const PS_FORMAT: &str = "{{.ID}}\t{{.Names}}\t{{.Image}}\t{{.Status}}\t{{.State}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CgroupLayout {
    /// Per-controller hierarchies (`memory/docker/<id>`).
    V1,
    /// Unified hierarchy with systemd scopes (`system.slice/docker-<id>.scope`).
    V2,
}

impl CgroupLayout {
    pub fn detect(root: &Path) -> Self {
        if root.join("cgroup.controllers").exists() {
            Self::V2
        } else {
            Self::V1
        }
    }
}

pub struct DockerCollector {
    root: PathBuf,
    program: String,
}

impl Default for DockerCollector {
    fn default() -> Self {
        Self { root: PathBuf::from(CGROUP_ROOT), program: "docker".to_string() }
    }
}

impl DockerCollector {
    insight_core::setters! {
        into { root: PathBuf, program: String }
    }

    pub async fn collect(&self) -> Result<DockerStat, CollectError> {
        let containers = self.containers().await?;
        let layout = CgroupLayout::detect(&self.root);
        let mut stat = DockerStat::default();
        for container in containers.iter().filter(|c| c.running) {
            match self.cpu_usage(layout, &container.container_id) {
                Ok(usage) => stat.cgroup_cpu_docker_usages.push(usage),
                Err(e) => tracing::debug!(container = %container.name, error = %e, "no cgroup cpu usage"),
            }
            match self.memory(layout, &container.container_id) {
                Ok(mem) => stat.cgroup_mem_dockers.push(mem),
                Err(e) => tracing::debug!(container = %container.name, error = %e, "no cgroup memory usage"),
            }
        }
        stat.cgroup_docker_stats = containers;
        Ok(stat)
    }

    async fn containers(&self) -> Result<Vec<CgroupDockerStat>, CollectError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["ps", "--all", "--no-trunc", "--format", PS_FORMAT]);
        let output = run_with_timeout(cmd, TOOL_TIMEOUT, "docker").await.map_err(CollectError::Tool)?;
        if !output.status.success() {
            return Err(CollectError::Tool(format!("docker ps: {}", combined_output(&output).trim())));
        }
        Ok(parse_ps(&String::from_utf8_lossy(&output.stdout)))
    }

    fn container_dir(&self, layout: CgroupLayout, controller: &str, id: &str) -> PathBuf {
        match layout {
            CgroupLayout::V1 => self.root.join(controller).join("docker").join(id),
            CgroupLayout::V2 => self.root.join("system.slice").join(format!("docker-{}.scope", id)),
        }
    }

    /// Cumulative CPU time in seconds.
    fn cpu_usage(&self, layout: CgroupLayout, id: &str) -> Result<f64, CollectError> {
        let dir = self.container_dir(layout, "cpuacct", id);
        match layout {
            CgroupLayout::V1 => {
                let nanos: u64 = parse_number("cpuacct.usage", &read(dir.join("cpuacct.usage"))?)?;
                Ok(nanos as f64 / 1e9)
            }
            CgroupLayout::V2 => {
                let stat = read(dir.join("cpu.stat"))?;
                let micros = stat
                    .lines()
                    .find_map(|l| l.strip_prefix("usage_usec "))
                    .ok_or_else(|| CollectError::parse("cpu.stat", "no usage_usec"))?;
                let micros: u64 = parse_number("cpu.stat", micros)?;
                Ok(micros as f64 / 1e6)
            }
        }
    }

    fn memory(&self, layout: CgroupLayout, id: &str) -> Result<CgroupMemDocker, CollectError> {
        let dir = self.container_dir(layout, "memory", id);
        let mut mem = parse_memory_stat(&read(dir.join("memory.stat"))?);
        let (usage, peak, limit) = match layout {
            CgroupLayout::V1 => ("memory.usage_in_bytes", "memory.max_usage_in_bytes", "memory.limit_in_bytes"),
            CgroupLayout::V2 => ("memory.current", "memory.peak", "memory.max"),
        };
        mem.mem_usage_in_bytes = parse_number(usage, &read(dir.join(usage))?)?;
        // memory.peak only exists on newer kernels
        mem.mem_max_usage_in_bytes = read(dir.join(peak)).and_then(|t| parse_number(peak, &t)).unwrap_or_default();
        mem.mem_limit_in_bytes = parse_number(limit, &read(dir.join(limit))?)?;
        Ok(mem)
    }
}

/// Tab-separated `docker ps` rows in [`PS_FORMAT`] order.
pub fn parse_ps(text: &str) -> Vec<CgroupDockerStat> {
    text.lines()
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let id = cols.next()?.trim();
            if id.is_empty() {
                return None;
            }
            let name = cols.next().unwrap_or_default();
            let image = cols.next().unwrap_or_default();
            let status = cols.next().unwrap_or_default();
            let state = cols.next().unwrap_or_default();
            Some(CgroupDockerStat {
                container_id: id.to_string(),
                name: name.to_string(),
                image: image.to_string(),
                status: status.to_string(),
                running: state.trim() == "running",
            })
        })
        .collect()
}

/// `memory.stat` in either layout. The unified hierarchy has no
/// hierarchical totals, so they mirror the local values there.
pub fn parse_memory_stat(text: &str) -> CgroupMemDocker {
    let mut mem = CgroupMemDocker::default();
    let mut unified = false;
    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(Ok(value))) = (parts.next(), parts.next().map(str::parse::<u64>)) else {
            continue;
        };
        let slot = match key {
            "cache" => &mut mem.cache,
            "rss" => &mut mem.rss,
            "rss_huge" => &mut mem.rss_huge,
            "mapped_file" => &mut mem.mapped_file,
            "total_cache" => &mut mem.total_cache,
            "total_rss" => &mut mem.total_rss,
            "total_rss_huge" => &mut mem.total_rss_huge,
            "total_mapped_file" => &mut mem.total_mapped_file,
            "file" | "anon" | "anon_thp" | "file_mapped" => {
                unified = true;
                match key {
                    "file" => &mut mem.cache,
                    "anon" => &mut mem.rss,
                    "anon_thp" => &mut mem.rss_huge,
                    _ => &mut mem.mapped_file,
                }
            }
            _ => continue,
        };
        *slot = value;
    }
    if unified {
        mem.total_cache = mem.cache;
        mem.total_rss = mem.rss;
        mem.total_rss_huge = mem.rss_huge;
        mem.total_mapped_file = mem.mapped_file;
    }
    mem
}

/// A single integer file. `max` means unlimited.
fn parse_number(what: &'static str, text: &str) -> Result<u64, CollectError> {
    let text = text.trim();
    if text == "max" {
        return Ok(u64::MAX);
    }
    text.parse().map_err(|_| CollectError::parse(what, format!("bad value {:?}", text)))
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
