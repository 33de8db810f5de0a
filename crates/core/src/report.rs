// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! NodeReport: prose per facet of a node's health and statistics.

use serde::{Deserialize, Serialize};

/// Report facets in the order they are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    Cpu,
    Disk,
    Docker,
    Health,
    Host,
    Load,
    Mem,
    Net,
    Process,
}

crate::simple_display! {
    Facet {
        Cpu => "cpuReport",
        Disk => "diskReport",
        Docker => "dockerReport",
        Health => "healthReport",
        Host => "hostReport",
        Load => "loadReport",
        Mem => "memReport",
        Net => "netReport",
        Process => "processReport",
    }
}

impl Facet {
    pub const ALL: [Facet; 9] = [
        Facet::Cpu,
        Facet::Disk,
        Facet::Docker,
        Facet::Health,
        Facet::Host,
        Facet::Load,
        Facet::Mem,
        Facet::Net,
        Facet::Process,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeReport {
    pub cpu_report: String,
    pub disk_report: String,
    pub docker_report: String,
    pub health_report: String,
    pub host_report: String,
    pub load_report: String,
    pub mem_report: String,
    pub net_report: String,
    pub process_report: String,
}

impl NodeReport {
    pub fn get(&self, facet: Facet) -> &str {
        match facet {
            Facet::Cpu => &self.cpu_report,
            Facet::Disk => &self.disk_report,
            Facet::Docker => &self.docker_report,
            Facet::Health => &self.health_report,
            Facet::Host => &self.host_report,
            Facet::Load => &self.load_report,
            Facet::Mem => &self.mem_report,
            Facet::Net => &self.net_report,
            Facet::Process => &self.process_report,
        }
    }

    pub fn set(&mut self, facet: Facet, text: String) {
        let slot = match facet {
            Facet::Cpu => &mut self.cpu_report,
            Facet::Disk => &mut self.disk_report,
            Facet::Docker => &mut self.docker_report,
            Facet::Health => &mut self.health_report,
            Facet::Host => &mut self.host_report,
            Facet::Load => &mut self.load_report,
            Facet::Mem => &mut self.mem_report,
            Facet::Net => &mut self.net_report,
            Facet::Process => &mut self.process_report,
        };
        *slot = text;
    }
}
