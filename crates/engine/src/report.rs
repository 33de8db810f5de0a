// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turns a node's health text and statistics into per-facet prose.

use crate::error::SightError;
use crate::sight::guarded;
use insight_adapters::GptAdapter;
use insight_core::{Facet, NodeReport, NodeStat};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

const INSTRUCTION: &str = "You are a site reliability engineer. Summarize the following node data \
in a short paragraph, pointing out anything abnormal and what to check next.";

/// Asks the chat service for one paragraph per [`Facet`].
#[derive(Clone, Debug)]
pub struct ReportComposer<G: GptAdapter> {
    gpt: G,
}

impl<G: GptAdapter> ReportComposer<G> {
    pub fn new(gpt: G) -> Self {
        Self { gpt }
    }

    /// Facets are requested one at a time in [`Facet::ALL`] order. A failed
    /// request leaves its facet empty; only cancellation aborts, including
    /// mid-request.
    pub async fn compose(
        &self,
        health: &str,
        stat: &NodeStat,
        cancel: &CancellationToken,
    ) -> Result<NodeReport, SightError> {
        let mut report = NodeReport::default();
        if !self.gpt.available() {
            tracing::debug!("chat service not configured, node report left empty");
            return Ok(report);
        }

        for facet in Facet::ALL {
            if cancel.is_cancelled() {
                return Err(SightError::Canceled);
            }
            let prompt = prompt(facet, health, stat)?;
            let reply = guarded(cancel, async { Ok::<_, SightError>(self.gpt.chat(&prompt).await) }).await?;
            match reply {
                Ok(text) => report.set(facet, text.trim().to_string()),
                Err(e) => tracing::warn!(facet = %facet, error = %e, "report facet failed"),
            }
        }
        Ok(report)
    }
}

/// Prompt for one facet: the instruction plus the facet's data.
pub fn prompt(facet: Facet, health: &str, stat: &NodeStat) -> Result<String, SightError> {
    let data = match facet {
        Facet::Health => health.to_string(),
        Facet::Cpu => render(&stat.cpu_stat)?,
        Facet::Disk => render(&stat.disk_stat)?,
        Facet::Docker => render(&stat.docker_stat)?,
        Facet::Host => render(&stat.host_stat)?,
        Facet::Load => render(&stat.load_stat)?,
        Facet::Mem => render(&stat.mem_stat)?,
        Facet::Net => render(&stat.net_stat)?,
        Facet::Process => render(&stat.process_stat)?,
    };
    Ok(format!("{}\n\n{}:\n{}", INSTRUCTION, facet.to_string().trim_end_matches("Report"), data))
}

fn render<T: Serialize>(section: &T) -> Result<String, SightError> {
    serde_json::to_string(section).map_err(|e| SightError::Report(e.to_string()))
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
