// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sections backed by sysinfo, topped up from `/proc` and `/sys`.

use crate::error::CollectError;
use crate::procfs::{self, read};
use insight_core::stat::{
    CpuStat, DiskStat, DiskUsage, HostStat, LoadAvg, LoadStat, MemStat, MemSwapMemory, NetInterface, NetIo,
    NetStat, ProcessInfo, ProcessStat,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use sysinfo::{
    CpuExt, DiskExt, NetworkExt, NetworksExt, Pid, PidExt, ProcessExt, System, SystemExt, UserExt,
};

/// Where the kernel files live. Tests point this at a temporary tree.
#[derive(Debug, Clone)]
pub struct Roots {
    pub proc: PathBuf,
    pub sys: PathBuf,
    pub etc: PathBuf,
}

impl Default for Roots {
    fn default() -> Self {
        Self { proc: PathBuf::from("/proc"), sys: PathBuf::from("/sys"), etc: PathBuf::from("/etc") }
    }
}

pub fn cpu(sys: &System, roots: &Roots) -> Result<CpuStat, CollectError> {
    let cpu_times = procfs::parse_cpu_times(&read(roots.proc.join("stat"))?)?;
    Ok(CpuStat {
        physical_count: sys.physical_core_count().unwrap_or_default() as u64,
        logical_count: sys.cpus().len() as u64,
        cpu_percents: sys.cpus().iter().map(|c| f64::from(c.cpu_usage())).collect(),
        cpu_times,
    })
}

pub fn disk(sys: &System, roots: &Roots) -> Result<DiskStat, CollectError> {
    let disk_partitions = procfs::parse_mounts(&read(roots.proc.join("mounts"))?);
    let root = sys
        .disks()
        .iter()
        .find(|d| d.mount_point() == Path::new("/"))
        .ok_or_else(|| CollectError::parse("disks", "no disk mounted at /"))?;
    let total = root.total_space();
    let free = root.available_space();
    let used = total.saturating_sub(free);
    Ok(DiskStat {
        disk_partitions,
        disk_usage: DiskUsage {
            path: "/".to_string(),
            fs_type: String::from_utf8_lossy(root.file_system()).into_owned(),
            total,
            free,
            used,
            used_percent: procfs::percent(used, total),
        },
    })
}

pub fn host(sys: &System, roots: &Roots) -> Result<HostStat, CollectError> {
    let release = read(roots.etc.join("os-release")).map(|t| procfs::parse_os_release(&t)).unwrap_or_default();
    let platform = sys.distribution_id();
    let platform_family = release
        .get("ID_LIKE")
        .and_then(|like| like.split_whitespace().next())
        .map(str::to_string)
        .unwrap_or_else(|| platform.clone());
    let host_id = read(roots.etc.join("machine-id"))
        .or_else(|_| read(roots.sys.join("class/dmi/id/product_uuid")))
        .map(|id| id.trim().to_string())
        .unwrap_or_default();

    Ok(HostStat {
        hostname: sys.host_name().ok_or_else(|| CollectError::parse("host", "no hostname"))?,
        procs: sys.processes().len() as u64,
        os: std::env::consts::OS.to_string(),
        platform,
        platform_family,
        platform_version: sys.os_version().unwrap_or_default(),
        kernel_version: sys.kernel_version().unwrap_or_default(),
        kernel_arch: std::env::consts::ARCH.to_string(),
        host_id,
    })
}

pub fn load(sys: &System, roots: &Roots) -> Result<LoadStat, CollectError> {
    let avg = sys.load_average();
    let load_misc = procfs::parse_load_misc(&read(roots.proc.join("stat"))?, &read(roots.proc.join("loadavg"))?)?;
    Ok(LoadStat { load_avg: LoadAvg { load1: avg.one, load5: avg.five, load15: avg.fifteen }, load_misc })
}

pub fn mem(sys: &System, roots: &Roots) -> Result<MemStat, CollectError> {
    let total = sys.total_swap();
    let used = sys.used_swap();
    Ok(MemStat {
        mem_swap_devices: procfs::parse_swaps(&read(roots.proc.join("swaps"))?)?,
        mem_swap_memory: MemSwapMemory { total, used, free: sys.free_swap(), used_percent: procfs::percent(used, total) },
        mem_virtual: procfs::parse_meminfo(&read(roots.proc.join("meminfo"))?)?,
    })
}

pub fn net(sys: &System, roots: &Roots) -> Result<NetStat, CollectError> {
    let mut net_ios: Vec<NetIo> = sys
        .networks()
        .iter()
        .map(|(name, data)| NetIo {
            name: name.clone(),
            bytes_sent: data.total_transmitted(),
            bytes_recv: data.total_received(),
            packets_sent: data.total_packets_transmitted(),
            packets_recv: data.total_packets_received(),
        })
        .collect();
    net_ios.sort_by(|a, b| a.name.cmp(&b.name));

    let v6 = read(roots.proc.join("net/if_inet6")).map(|t| procfs::parse_if_inet6(&t)).unwrap_or_default();
    let class = roots.sys.join("class/net");
    let net_interfaces = net_ios.iter().map(|io| interface(&class.join(&io.name), &io.name, &v6)).collect();
    Ok(NetStat { net_ios, net_interfaces })
}

fn interface(dir: &Path, name: &str, v6: &HashMap<String, Vec<String>>) -> NetInterface {
    let attr = |file: &str| read(dir.join(file)).map(|t| t.trim().to_string()).unwrap_or_default();
    let flags = u32::from_str_radix(attr("flags").trim_start_matches("0x"), 16).unwrap_or_default();
    NetInterface {
        index: attr("ifindex").parse().unwrap_or_default(),
        mtu: attr("mtu").parse().unwrap_or_default(),
        name: name.to_string(),
        hardware_addr: attr("address"),
        flags: procfs::interface_flags(flags),
        addrs: v6.get(name).cloned().unwrap_or_default(),
    }
}

pub fn process(sys: &System, roots: &Roots) -> Result<ProcessStat, CollectError> {
    let total_memory = sys.total_memory();
    let mut children: HashMap<Pid, Vec<i32>> = HashMap::new();
    for (pid, proc_) in sys.processes() {
        if let Some(parent) = proc_.parent() {
            children.entry(parent).or_default().push(pid.as_u32() as i32);
        }
    }

    let mut process_infos: Vec<ProcessInfo> = sys
        .processes()
        .iter()
        .map(|(pid, proc_)| {
            let dir = roots.proc.join(pid.as_u32().to_string());
            let status = read(dir.join("status")).map(|t| procfs::parse_pid_status(&t)).unwrap_or_default();
            let background = read(dir.join("stat"))
                .and_then(|t| procfs::parse_pid_groups(&t))
                .map(|(pgrp, tpgid)| pgrp != tpgid)
                .unwrap_or(true);
            let ppid = proc_.parent().map(|p| p.as_u32() as i32).unwrap_or_default();
            let mut kids = children.get(pid).cloned().unwrap_or_default();
            kids.sort_unstable();

            ProcessInfo {
                pid: pid.as_u32() as i32,
                background,
                cpu_percent: f64::from(proc_.cpu_usage()),
                children: kids,
                cmdline: proc_.cmd().join(" "),
                environs: proc_.environ().to_vec(),
                io_nice: 0,
                is_running: true,
                memory_percent: procfs::percent(proc_.memory(), total_memory) as f32,
                name: proc_.name().to_string(),
                num_fd: std::fs::read_dir(dir.join("fd")).map(|d| d.count() as i32).unwrap_or_default(),
                num_thread: status.threads,
                parent: ppid,
                ppid,
                rlimits: read(dir.join("limits")).map(|t| procfs::parse_limits(&t)).unwrap_or_default(),
                statuses: vec![proc_.status().to_string()],
                uids: status.uids,
                username: proc_
                    .user_id()
                    .and_then(|uid| sys.get_user_by_id(uid))
                    .map(|user| user.name().to_string())
                    .unwrap_or_default(),
                memory_info: status.memory,
            }
        })
        .collect();
    process_infos.sort_by_key(|p| p.pid);
    Ok(ProcessStat { process_infos })
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
