// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dispatcher: one worker per trigger present, results collected into
//! a single response.

use crate::build::BuildSight;
use crate::code::CodeSight;
use crate::error::SightError;
use crate::group::TaskGroup;
use crate::node::NodeSight;
use crate::sight::Sight;
use insight_adapters::{GptAdapter, HttpTransport, ReqwestTransport, SshAdapter};
use insight_core::{Config, ConfigError, TriggerRequest, TriggerResponse};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// What a dispatch produced. Infos from sights that finished are kept even
/// when `error` is set.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub response: TriggerResponse,
    pub error: Option<SightError>,
}

pub struct Insight<S: SshAdapter, G: GptAdapter, T: HttpTransport = ReqwestTransport> {
    build: Arc<BuildSight<T>>,
    code: Arc<CodeSight<T>>,
    node: Arc<NodeSight<S, G>>,
    concurrency: usize,
}

impl<S: SshAdapter, G: GptAdapter> Insight<S, G, ReqwestTransport> {
    /// Production wiring: HTTP clients from the config, caller-chosen SSH
    /// and chat adapters.
    pub fn from_config(ssh: S, gpt: G, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            BuildSight::from_config(config),
            CodeSight::from_config(config),
            NodeSight::from_config(ssh, gpt, config)?,
        )
        .concurrency(config.spec.concurrency))
    }
}

impl<S: SshAdapter, G: GptAdapter, T: HttpTransport> Insight<S, G, T> {
    pub fn new(build: BuildSight<T>, code: CodeSight<T>, node: NodeSight<S, G>) -> Self {
        Self { build: Arc::new(build), code: Arc::new(code), node: Arc::new(node), concurrency: 0 }
    }

    insight_core::setters! {
        set { concurrency: usize }
    }

    /// Run every sight whose trigger is present and wait for all of them.
    /// The first failure cancels the others.
    pub async fn run(&self, request: &TriggerRequest, cancel: &CancellationToken) -> Dispatch {
        let slots = Arc::new(Mutex::new(TriggerResponse::default()));
        let mut group = TaskGroup::new(cancel, self.concurrency);

        if let Some(trigger) = &request.build_trigger {
            launch(&mut group, &self.build, trigger.clone(), &slots, |r, info| r.build_info = Some(info));
        }
        if let Some(trigger) = &request.code_trigger {
            launch(&mut group, &self.code, trigger.clone(), &slots, |r, info| r.code_info = Some(info));
        }
        if let Some(trigger) = &request.node_trigger {
            launch(&mut group, &self.node, trigger.clone(), &slots, |r, info| r.node_info = Some(info));
        }

        tracing::info!(workers = group.len(), concurrency = self.concurrency, "dispatching triggers");
        let error = group.wait().await;
        let response = std::mem::take(&mut *slots.lock());
        match &error {
            Some(e) => tracing::warn!(error = %e, "dispatch finished with error"),
            None => tracing::info!("dispatch finished"),
        }
        Dispatch { response, error }
    }
}

fn launch<X: Sight>(
    group: &mut TaskGroup,
    sight: &Arc<X>,
    trigger: X::Trigger,
    slots: &Arc<Mutex<TriggerResponse>>,
    store: fn(&mut TriggerResponse, X::Info),
) {
    let sight = Arc::clone(sight);
    let slots = Arc::clone(slots);
    let token = group.token();
    group.spawn(sight.name(), async move {
        let outcome = sight.run(&trigger, &token).await;
        let mut response = slots.lock();
        store(&mut response, outcome.info);
        // several sights may propose mail; the last to finish wins
        if let Some(mail) = outcome.mail {
            response.mail_info = Some(mail);
        }
        match outcome.error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    });
}

#[cfg(test)]
#[path = "insight_tests.rs"]
mod tests;
