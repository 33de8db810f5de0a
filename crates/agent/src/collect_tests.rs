// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

#[test]
fn failed_section_falls_back_to_default() {
    let value: u64 = section("load", Err(CollectError::Tool("boom".into())));
    assert_eq!(value, 0);
    assert_eq!(section("load", Ok::<_, CollectError>(7u64)), 7);
}

#[tokio::test]
async fn snapshot_survives_missing_sources() {
    let empty = tempfile::tempdir().unwrap();
    let roots = Roots {
        proc: empty.path().join("proc"),
        sys: empty.path().join("sys"),
        etc: empty.path().join("etc"),
    };
    let collector = Collector::default()
        .roots(roots)
        .docker(DockerCollector::default().program("/nonexistent/docker"));

    let stat = collector.collect(Duration::ZERO).await;

    assert_eq!(stat.docker_stat, Default::default());
    assert_eq!(stat.mem_stat, Default::default());
    assert_eq!(stat.load_stat, Default::default());
    assert!(stat.cpu_stat.cpu_times.is_empty());
}

#[tokio::test]
async fn snapshot_of_this_machine() {
    let collector = Collector::default()
        .docker(DockerCollector::default().program("/nonexistent/docker").root(PathBuf::from("/nonexistent")));

    let stat = collector.collect(Duration::from_millis(10)).await;

    assert!(stat.cpu_stat.logical_count > 0);
    assert!(!stat.cpu_stat.cpu_times.is_empty());
    assert!(stat.mem_stat.mem_virtual.total > 0);
    assert!(stat.load_stat.load_misc.procs_total > 0);
    let json = serde_json::to_value(&stat).unwrap();
    assert!(json["cpuStat"]["cpuPercents"].is_array());
}
