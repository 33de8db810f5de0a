// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NodeStat: the single JSON document printed by the remote agent.
//!
//! Every top-level section is required so a truncated or foreign document
//! fails to decode; fields inside a section default when absent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStat {
    pub cpu_stat: CpuStat,
    pub disk_stat: DiskStat,
    pub docker_stat: DockerStat,
    pub host_stat: HostStat,
    pub load_stat: LoadStat,
    pub mem_stat: MemStat,
    pub net_stat: NetStat,
    pub process_stat: ProcessStat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuStat {
    pub physical_count: u64,
    pub logical_count: u64,
    pub cpu_percents: Vec<f64>,
    pub cpu_times: Vec<CpuTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CpuTime {
    pub cpu: String,
    pub user: f64,
    pub system: f64,
    pub idle: f64,
    pub nice: f64,
    #[serde(rename = "iowait")]
    pub io_wait: f64,
    pub irq: f64,
    #[serde(rename = "softirq")]
    pub soft_irq: f64,
    pub steal: f64,
    pub guest: f64,
    pub guest_nice: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskStat {
    pub disk_partitions: Vec<DiskPartition>,
    pub disk_usage: DiskUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskPartition {
    pub device: String,
    pub mountpoint: String,
    pub fstype: String,
    pub opts: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiskUsage {
    pub path: String,
    #[serde(rename = "fstype")]
    pub fs_type: String,
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DockerStat {
    pub cgroup_cpu_docker_usages: Vec<f64>,
    pub cgroup_docker_stats: Vec<CgroupDockerStat>,
    pub cgroup_mem_dockers: Vec<CgroupMemDocker>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CgroupDockerStat {
    pub container_id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub running: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CgroupMemDocker {
    pub cache: u64,
    pub rss: u64,
    pub rss_huge: u64,
    pub mapped_file: u64,
    pub total_cache: u64,
    pub total_rss: u64,
    pub total_rss_huge: u64,
    pub total_mapped_file: u64,
    pub mem_usage_in_bytes: u64,
    pub mem_max_usage_in_bytes: u64,
    pub mem_limit_in_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HostStat {
    pub hostname: String,
    pub procs: u64,
    pub os: String,
    pub platform: String,
    pub platform_family: String,
    pub platform_version: String,
    pub kernel_version: String,
    pub kernel_arch: String,
    #[serde(rename = "hostID")]
    pub host_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadStat {
    pub load_avg: LoadAvg,
    pub load_misc: LoadMisc,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoadMisc {
    pub procs_total: u64,
    pub procs_created: u64,
    pub procs_running: u64,
    pub procs_blocked: u64,
    pub ctxt: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemStat {
    pub mem_swap_devices: Vec<MemSwapDevice>,
    pub mem_swap_memory: MemSwapMemory,
    pub mem_virtual: MemVirtual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemSwapDevice {
    pub name: String,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemSwapMemory {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub used_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemVirtual {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
    pub free: u64,
    pub buffer: u64,
    pub cached: u64,
    pub swap_cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
    pub mapped: u64,
    pub vmalloc_total: u64,
    pub vmalloc_used: u64,
    pub vmalloc_chunk: u64,
    pub huge_pages_total: u64,
    pub huge_pages_free: u64,
    pub huge_pages_rsvd: u64,
    pub huge_pages_surp: u64,
    pub huge_page_size: u64,
    pub anon_huge_page: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetStat {
    pub net_ios: Vec<NetIo>,
    pub net_interfaces: Vec<NetInterface>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetIo {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetInterface {
    pub index: i64,
    pub mtu: i64,
    pub name: String,
    pub hardware_addr: String,
    pub flags: Vec<String>,
    pub addrs: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessStat {
    pub process_infos: Vec<ProcessInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessInfo {
    pub pid: i32,
    pub background: bool,
    pub cpu_percent: f64,
    pub children: Vec<i32>,
    pub cmdline: String,
    pub environs: Vec<String>,
    #[serde(rename = "ionice")]
    pub io_nice: i32,
    pub is_running: bool,
    pub memory_info: ProcessMemoryInfo,
    pub memory_percent: f32,
    pub name: String,
    pub num_fd: i32,
    pub num_thread: i32,
    pub parent: i32,
    pub ppid: i32,
    pub rlimits: Vec<ProcessRlimit>,
    pub statuses: Vec<String>,
    pub uids: Vec<i32>,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessMemoryInfo {
    pub rss: u64,
    pub vms: u64,
    pub hwm: u64,
    pub data: u64,
    pub stack: u64,
    pub locked: u64,
    pub swap: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessRlimit {
    pub resource: i32,
    pub soft: u64,
    pub hard: u64,
    pub used: u64,
}

#[cfg(test)]
#[path = "stat_tests.rs"]
mod tests;
