// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsers for the `/proc` files sysinfo does not expose.
//!
//! Every parser takes the file's text so it can be tested without a live
//! procfs; [`read`] does the I/O.

use crate::error::CollectError;
use insight_core::stat::{
    CpuTime, DiskPartition, LoadMisc, MemSwapDevice, MemVirtual, ProcessMemoryInfo, ProcessRlimit,
};
use std::collections::HashMap;
use std::path::Path;

/// Kernel clock ticks per second for `/proc/stat` counters.
pub const USER_HZ: f64 = 100.0;

pub fn read(path: impl AsRef<Path>) -> Result<String, CollectError> {
    let path = path.as_ref();
    std::fs::read_to_string(path).map_err(|source| CollectError::Io { path: path.to_path_buf(), source })
}

fn field<T: std::str::FromStr>(what: &'static str, value: Option<&str>) -> Result<T, CollectError> {
    let value = value.ok_or_else(|| CollectError::parse(what, "missing field"))?;
    value.parse().map_err(|_| CollectError::parse(what, format!("bad value {:?}", value)))
}

/// `/proc/stat` counters plus the total from `/proc/loadavg`.
pub fn parse_load_misc(stat: &str, loadavg: &str) -> Result<LoadMisc, CollectError> {
    let mut misc = LoadMisc::default();
    for line in stat.lines() {
        let mut parts = line.split_whitespace();
        let slot = match parts.next() {
            Some("ctxt") => &mut misc.ctxt,
            Some("processes") => &mut misc.procs_created,
            Some("procs_running") => &mut misc.procs_running,
            Some("procs_blocked") => &mut misc.procs_blocked,
            _ => continue,
        };
        *slot = field("/proc/stat", parts.next())?;
    }

    // fourth field is "running/total"
    let entities = loadavg.split_whitespace().nth(3);
    let total = entities.and_then(|e| e.split('/').nth(1));
    misc.procs_total = field("/proc/loadavg", total)?;
    Ok(misc)
}

/// One entry per `cpu`/`cpuN` line of `/proc/stat`, in seconds.
pub fn parse_cpu_times(stat: &str) -> Result<Vec<CpuTime>, CollectError> {
    let mut times = Vec::new();
    for line in stat.lines().filter(|l| l.starts_with("cpu")) {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let ticks = parts
            .map(|p| p.parse::<f64>().map(|t| t / USER_HZ))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| CollectError::parse("/proc/stat", format!("bad counter on {:?}", name)))?;
        if ticks.len() < 4 {
            return Err(CollectError::parse("/proc/stat", format!("short line for {:?}", name)));
        }
        let at = |i: usize| ticks.get(i).copied().unwrap_or_default();
        times.push(CpuTime {
            cpu: if name == "cpu" { "cpu-total".to_string() } else { name.to_string() },
            user: at(0),
            nice: at(1),
            system: at(2),
            idle: at(3),
            io_wait: at(4),
            irq: at(5),
            soft_irq: at(6),
            steal: at(7),
            guest: at(8),
            guest_nice: at(9),
        });
    }
    Ok(times)
}

/// `/proc/swaps`: sizes are KiB.
pub fn parse_swaps(swaps: &str) -> Result<Vec<MemSwapDevice>, CollectError> {
    let mut devices = Vec::new();
    for line in swaps.lines().skip(1).filter(|l| !l.trim().is_empty()) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(CollectError::parse("/proc/swaps", format!("short line {:?}", line)));
        }
        let size: u64 = field("/proc/swaps", parts.get(2).copied())?;
        let used: u64 = field("/proc/swaps", parts.get(3).copied())?;
        devices.push(MemSwapDevice {
            name: parts[0].to_string(),
            used_bytes: used * 1024,
            free_bytes: size.saturating_sub(used) * 1024,
        });
    }
    Ok(devices)
}

/// `key: value [kB]` files (`/proc/meminfo`, `/proc/<pid>/status`) as a
/// map of byte counts. Values without a unit are kept as-is.
fn kv_bytes(text: &str) -> HashMap<&str, u64> {
    text.lines()
        .filter_map(|line| {
            let (key, rest) = line.split_once(':')?;
            let mut parts = rest.split_whitespace();
            let value: u64 = parts.next()?.parse().ok()?;
            let scale = if parts.next() == Some("kB") { 1024 } else { 1 };
            Some((key.trim(), value * scale))
        })
        .collect()
}

pub fn parse_meminfo(meminfo: &str) -> Result<MemVirtual, CollectError> {
    let map = kv_bytes(meminfo);
    let get = |key: &str| map.get(key).copied().unwrap_or_default();
    let total = *map.get("MemTotal").ok_or_else(|| CollectError::parse("/proc/meminfo", "no MemTotal"))?;

    let free = get("MemFree");
    let buffer = get("Buffers");
    let cached = get("Cached") + get("SReclaimable");
    let available = match map.get("MemAvailable") {
        Some(value) => *value,
        None => free + buffer + cached,
    };
    let used = total.saturating_sub(free + buffer + cached);
    Ok(MemVirtual {
        total,
        available,
        used,
        used_percent: percent(used, total),
        free,
        buffer,
        cached,
        swap_cached: get("SwapCached"),
        swap_total: get("SwapTotal"),
        swap_free: get("SwapFree"),
        mapped: get("Mapped"),
        vmalloc_total: get("VmallocTotal"),
        vmalloc_used: get("VmallocUsed"),
        vmalloc_chunk: get("VmallocChunk"),
        huge_pages_total: get("HugePages_Total"),
        huge_pages_free: get("HugePages_Free"),
        huge_pages_rsvd: get("HugePages_Rsvd"),
        huge_pages_surp: get("HugePages_Surp"),
        huge_page_size: get("Hugepagesize"),
        anon_huge_page: get("AnonHugePages"),
    })
}

pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

/// `/proc/mounts`, keeping only block devices.
pub fn parse_mounts(mounts: &str) -> Vec<DiskPartition> {
    mounts
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (device, mountpoint, fstype, opts) = (parts.first()?, parts.get(1)?, parts.get(2)?, parts.get(3)?);
            if !device.starts_with('/') {
                return None;
            }
            Some(DiskPartition {
                device: device.to_string(),
                mountpoint: unescape_octal(mountpoint),
                fstype: fstype.to_string(),
                opts: opts.split(',').map(str::to_string).collect(),
            })
        })
        .collect()
}

/// Mount tables escape spaces and tabs as `\040`-style octal.
fn unescape_octal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        let code = rest.get(at + 1..at + 4).and_then(|o| u8::from_str_radix(o, 8).ok());
        match code {
            Some(byte) => {
                out.push(byte as char);
                rest = &rest[at + 4..];
            }
            None => {
                out.push('\\');
                rest = &rest[at + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// What `/proc/<pid>/status` adds on top of sysinfo's process view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidStatus {
    pub memory: ProcessMemoryInfo,
    pub threads: i32,
    pub uids: Vec<i32>,
}

pub fn parse_pid_status(status: &str) -> PidStatus {
    let map = kv_bytes(status);
    let get = |key: &str| map.get(key).copied().unwrap_or_default();
    let uids = status
        .lines()
        .find_map(|l| l.strip_prefix("Uid:"))
        .map(|rest| rest.split_whitespace().filter_map(|u| u.parse().ok()).collect())
        .unwrap_or_default();
    PidStatus {
        memory: ProcessMemoryInfo {
            rss: get("VmRSS"),
            vms: get("VmSize"),
            hwm: get("VmHWM"),
            data: get("VmData"),
            stack: get("VmStk"),
            locked: get("VmLck"),
            swap: get("VmSwap"),
        },
        threads: i32::try_from(get("Threads")).unwrap_or(i32::MAX),
        uids,
    }
}

/// Process group and terminal foreground group from `/proc/<pid>/stat`.
///
/// The command name may contain spaces and parentheses, so fields are
/// counted from the last `)`.
pub fn parse_pid_groups(stat: &str) -> Result<(i32, i32), CollectError> {
    let after = stat
        .rfind(')')
        .map(|at| &stat[at + 1..])
        .ok_or_else(|| CollectError::parse("/proc/<pid>/stat", "no command name"))?;
    // state ppid pgrp session tty_nr tpgid
    let fields: Vec<&str> = after.split_whitespace().collect();
    let pgrp = field("/proc/<pid>/stat", fields.get(2).copied())?;
    let tpgid = field("/proc/<pid>/stat", fields.get(5).copied())?;
    Ok((pgrp, tpgid))
}

/// `/proc/<pid>/limits`. Rows follow the kernel's RLIMIT numbering.
pub fn parse_limits(limits: &str) -> Vec<ProcessRlimit> {
    let header = limits.lines().next().unwrap_or_default();
    let Some(soft_col) = header.find("Soft Limit") else {
        return Vec::new();
    };
    limits
        .lines()
        .skip(1)
        .filter(|l| l.len() > soft_col)
        .enumerate()
        .map(|(resource, line)| {
            let mut values = line[soft_col..].split_whitespace();
            let limit = |v: Option<&str>| match v {
                Some("unlimited") | None => u64::MAX,
                Some(v) => v.parse().unwrap_or(u64::MAX),
            };
            ProcessRlimit {
                resource: resource as i32,
                soft: limit(values.next()),
                hard: limit(values.next()),
                used: 0,
            }
        })
        .collect()
}

/// `/proc/net/if_inet6` grouped by interface, as `addr/prefix`.
pub fn parse_if_inet6(text: &str) -> HashMap<String, Vec<String>> {
    let mut addrs: HashMap<String, Vec<String>> = HashMap::new();
    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (Some(hex), Some(prefix), Some(name)) = (parts.first(), parts.get(2), parts.get(5)) else {
            continue;
        };
        let (Ok(bits), Ok(prefix)) = (u128::from_str_radix(hex, 16), u8::from_str_radix(prefix, 16)) else {
            continue;
        };
        let addr = std::net::Ipv6Addr::from(bits);
        addrs.entry(name.to_string()).or_default().push(format!("{}/{}", addr, prefix));
    }
    addrs
}

/// Names for the `IFF_*` bits in `/sys/class/net/<if>/flags`.
pub fn interface_flags(flags: u32) -> Vec<String> {
    const NAMES: [(u32, &str); 5] =
        [(0x1, "up"), (0x2, "broadcast"), (0x8, "loopback"), (0x10, "pointtopoint"), (0x1000, "multicast")];
    NAMES.iter().filter(|(bit, _)| flags & bit != 0).map(|(_, name)| name.to_string()).collect()
}

/// `KEY=value` lines of `/etc/os-release`, quotes removed.
pub fn parse_os_release(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
        .collect()
}

#[cfg(test)]
#[path = "procfs_tests.rs"]
mod tests;
