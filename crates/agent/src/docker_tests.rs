// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::os::unix::fs::PermissionsExt;
use yare::parameterized;

const RUNNING_ID: &str = "aaaa1111";

fn fake_docker(dir: &Path, script: &str) -> PathBuf {
    let path = dir.join("docker");
    std::fs::write(&path, format!("#!/bin/sh\n{}", script)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn ps_script() -> String {
    format!(
        "printf '{}\\tweb\\tnginx:1.25\\tUp 2 hours\\trunning\\nbbbb2222\\tjob\\tbusybox\\tExited (0) 3 days ago\\texited\\n'",
        RUNNING_ID
    )
}

fn write(path: PathBuf, text: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, text).unwrap();
}

#[test]
fn ps_rows_become_container_stats() {
    let text = "abc\tweb\tnginx\tUp 2 hours\trunning\ndef\tjob\tbusybox\tExited (1)\texited\n\n";
    let stats = parse_ps(text);
    assert_eq!(stats.len(), 2);
    assert_eq!(
        stats[0],
        CgroupDockerStat {
            container_id: "abc".into(),
            name: "web".into(),
            image: "nginx".into(),
            status: "Up 2 hours".into(),
            running: true,
        }
    );
    assert!(!stats[1].running);
}

#[test]
fn v1_memory_stat_keeps_hierarchical_totals() {
    let mem = parse_memory_stat("cache 100\nrss 200\nrss_huge 0\nmapped_file 5\ntotal_cache 150\ntotal_rss 250\n");
    assert_eq!(mem.cache, 100);
    assert_eq!(mem.rss, 200);
    assert_eq!(mem.mapped_file, 5);
    assert_eq!(mem.total_cache, 150);
    assert_eq!(mem.total_rss, 250);
}

#[test]
fn v2_memory_stat_maps_unified_keys() {
    let mem = parse_memory_stat("anon 300\nfile 400\nkernel 12\nanon_thp 2\nfile_mapped 7\n");
    assert_eq!(mem.rss, 300);
    assert_eq!(mem.cache, 400);
    assert_eq!(mem.rss_huge, 2);
    assert_eq!(mem.mapped_file, 7);
    assert_eq!(mem.total_rss, 300);
    assert_eq!(mem.total_cache, 400);
}

#[parameterized(
    number = { "4096\n", Some(4096) },
    unlimited = { "max\n", Some(u64::MAX) },
    garbage = { "lots", None },
)]
fn numbers(text: &str, expected: Option<u64>) {
    assert_eq!(parse_number("memory.max", text).ok(), expected);
}

#[test]
fn layout_is_detected_from_root() {
    let root = tempfile::tempdir().unwrap();
    assert_eq!(CgroupLayout::detect(root.path()), CgroupLayout::V1);
    std::fs::write(root.path().join("cgroup.controllers"), "cpu memory\n").unwrap();
    assert_eq!(CgroupLayout::detect(root.path()), CgroupLayout::V2);
}

#[tokio::test]
async fn collects_v1_usage_for_running_containers() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    let mem = root.path().join("memory/docker").join(RUNNING_ID);
    write(mem.join("memory.stat"), "cache 10\nrss 20\n");
    write(mem.join("memory.usage_in_bytes"), "1000\n");
    write(mem.join("memory.max_usage_in_bytes"), "2000\n");
    write(mem.join("memory.limit_in_bytes"), "9223372036854771712\n");
    write(root.path().join("cpuacct/docker").join(RUNNING_ID).join("cpuacct.usage"), "2500000000\n");

    let stat = DockerCollector::default()
        .root(root.path())
        .program(fake_docker(tools.path(), &ps_script()).to_string_lossy())
        .collect()
        .await
        .unwrap();

    assert_eq!(stat.cgroup_docker_stats.len(), 2);
    assert_eq!(stat.cgroup_cpu_docker_usages, vec![2.5]);
    assert_eq!(stat.cgroup_mem_dockers.len(), 1);
    let mem = &stat.cgroup_mem_dockers[0];
    assert_eq!(mem.rss, 20);
    assert_eq!(mem.mem_usage_in_bytes, 1000);
    assert_eq!(mem.mem_max_usage_in_bytes, 2000);
    assert_eq!(mem.mem_limit_in_bytes, 9223372036854771712);
}

#[tokio::test]
async fn collects_v2_usage_for_running_containers() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();
    write(root.path().join("cgroup.controllers"), "cpu memory\n");
    let scope = root.path().join("system.slice").join(format!("docker-{}.scope", RUNNING_ID));
    write(scope.join("memory.stat"), "anon 30\nfile 40\n");
    write(scope.join("memory.current"), "5000\n");
    write(scope.join("memory.max"), "max\n");
    write(scope.join("cpu.stat"), "usage_usec 1500000\nuser_usec 1000000\n");

    let stat = DockerCollector::default()
        .root(root.path())
        .program(fake_docker(tools.path(), &ps_script()).to_string_lossy())
        .collect()
        .await
        .unwrap();

    assert_eq!(stat.cgroup_cpu_docker_usages, vec![1.5]);
    let mem = &stat.cgroup_mem_dockers[0];
    assert_eq!(mem.rss, 30);
    assert_eq!(mem.mem_usage_in_bytes, 5000);
    assert_eq!(mem.mem_max_usage_in_bytes, 0);
    assert_eq!(mem.mem_limit_in_bytes, u64::MAX);
}

#[tokio::test]
async fn missing_cgroup_files_still_list_containers() {
    let tools = tempfile::tempdir().unwrap();
    let root = tempfile::tempdir().unwrap();

    let stat = DockerCollector::default()
        .root(root.path())
        .program(fake_docker(tools.path(), &ps_script()).to_string_lossy())
        .collect()
        .await
        .unwrap();

    assert_eq!(stat.cgroup_docker_stats.len(), 2);
    assert!(stat.cgroup_cpu_docker_usages.is_empty());
    assert!(stat.cgroup_mem_dockers.is_empty());
}

#[tokio::test]
async fn failing_docker_cli_is_a_tool_error() {
    let tools = tempfile::tempdir().unwrap();
    let docker = fake_docker(tools.path(), "echo 'Cannot connect to the Docker daemon' >&2; exit 1");

    let err = DockerCollector::default().program(docker.to_string_lossy()).collect().await.unwrap_err();

    assert!(matches!(err, CollectError::Tool(_)));
    assert!(err.to_string().contains("Cannot connect"));
}

#[tokio::test]
async fn absent_docker_cli_is_a_tool_error() {
    let err = DockerCollector::default().program("/nonexistent/docker").collect().await.unwrap_err();
    assert!(err.to_string().starts_with("docker failed to run"));
}
