// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

/// A proc/sys/etc tree with just enough files for the parsers.
fn fake_roots() -> (tempfile::TempDir, Roots) {
    let dir = tempfile::tempdir().unwrap();
    let roots = Roots { proc: dir.path().join("proc"), sys: dir.path().join("sys"), etc: dir.path().join("etc") };
    let files = [
        ("proc/stat", "cpu 100 0 100 800 0 0 0 0 0 0\ncpu0 100 0 100 800 0 0 0 0 0 0\nctxt 10\nprocesses 20\nprocs_running 2\nprocs_blocked 0\n"),
        ("proc/loadavg", "0.10 0.20 0.30 2/300 42\n"),
        ("proc/swaps", "Filename Type Size Used Priority\n/dev/zram0 partition 1000 100 100\n"),
        ("proc/meminfo", "MemTotal: 1000 kB\nMemFree: 500 kB\nMemAvailable: 700 kB\n"),
        ("proc/mounts", "/dev/vda1 / ext4 rw 0 0\nproc /proc proc rw 0 0\n"),
        ("sys/class/net/eth0/ifindex", "2\n"),
        ("sys/class/net/eth0/mtu", "1500\n"),
        ("sys/class/net/eth0/address", "52:54:00:12:34:56\n"),
        ("sys/class/net/eth0/flags", "0x1003\n"),
        ("etc/machine-id", "0123456789abcdef\n"),
        ("etc/os-release", "ID=ubuntu\nID_LIKE=debian\n"),
    ];
    for (path, text) in files {
        let path = dir.path().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }
    (dir, roots)
}

#[test]
fn cpu_times_come_from_proc() {
    let (_dir, roots) = fake_roots();
    let stat = cpu(&System::new(), &roots).unwrap();
    assert_eq!(stat.cpu_times.len(), 2);
    assert_eq!(stat.cpu_times[0].cpu, "cpu-total");
    assert_eq!(stat.cpu_times[0].idle, 8.0);
}

#[test]
fn load_combines_sysinfo_and_proc() {
    let (_dir, roots) = fake_roots();
    let stat = load(&System::new(), &roots).unwrap();
    assert_eq!(stat.load_misc.procs_total, 300);
    assert_eq!(stat.load_misc.procs_created, 20);
    assert_eq!(stat.load_misc.ctxt, 10);
}

#[test]
fn mem_reads_swap_devices_and_meminfo() {
    let (_dir, roots) = fake_roots();
    let stat = mem(&System::new(), &roots).unwrap();
    assert_eq!(stat.mem_swap_devices.len(), 1);
    assert_eq!(stat.mem_swap_devices[0].name, "/dev/zram0");
    assert_eq!(stat.mem_virtual.total, 1000 * 1024);
    assert_eq!(stat.mem_virtual.available, 700 * 1024);
}

#[test]
fn missing_proc_file_fails_the_section() {
    let (dir, roots) = fake_roots();
    std::fs::remove_file(dir.path().join("proc/meminfo")).unwrap();
    let err = mem(&System::new(), &roots).unwrap_err();
    assert!(matches!(err, CollectError::Io { .. }));
}

#[test]
fn interface_reads_sysfs_attributes() {
    let (_dir, roots) = fake_roots();
    let v6 = HashMap::from([("eth0".to_string(), vec!["fe80::1/64".to_string()])]);
    let iface = interface(&roots.sys.join("class/net/eth0"), "eth0", &v6);
    assert_eq!(
        iface,
        NetInterface {
            index: 2,
            mtu: 1500,
            name: "eth0".into(),
            hardware_addr: "52:54:00:12:34:56".into(),
            flags: vec!["up".into(), "broadcast".into(), "multicast".into()],
            addrs: vec!["fe80::1/64".into()],
        }
    );
}

#[test]
fn interface_without_sysfs_entry_has_defaults() {
    let (_dir, roots) = fake_roots();
    let iface = interface(&roots.sys.join("class/net/wg0"), "wg0", &HashMap::new());
    assert_eq!(iface.name, "wg0");
    assert_eq!(iface.mtu, 0);
    assert!(iface.flags.is_empty());
}

#[test]
fn host_reads_identity_files() {
    let (_dir, roots) = fake_roots();
    let mut sys = System::new();
    sys.refresh_system();
    // container builds may lack a hostname; only check what the roots provide
    if let Ok(stat) = host(&sys, &roots) {
        assert_eq!(stat.host_id, "0123456789abcdef");
        assert_eq!(stat.platform_family, "debian");
        assert_eq!(stat.os, std::env::consts::OS);
    }
}

#[test]
fn processes_include_this_test() {
    let mut sys = System::new();
    sys.refresh_processes();
    let stat = process(&sys, &Roots::default()).unwrap();
    let me = std::process::id() as i32;
    let info = stat.process_infos.iter().find(|p| p.pid == me).unwrap();
    assert!(info.is_running);
    assert!(info.num_thread >= 1);
    assert!(!info.rlimits.is_empty());
    assert!(stat.process_infos.windows(2).all(|w| w[0].pid < w[1].pid));
}
