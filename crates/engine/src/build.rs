// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BuildSight: explain a build from its log, its commit and its change.

use crate::error::SightError;
use crate::logs::LogScan;
use crate::sight::{guarded, Outcome, Sight};
use async_trait::async_trait;
use futures::TryFutureExt;
use insight_adapters::{HttpTransport, RepoClient, ReqwestTransport, ReviewClient};
use insight_core::{
    BuildInfo, BuildTrigger, Config, GerritTrigger, LoggingConfig, MailInfo, RepoInfo, ReviewInfo,
};
use tokio_util::sync::CancellationToken;

pub struct BuildSight<T: HttpTransport = ReqwestTransport> {
    review: ReviewClient<T>,
    repo: RepoClient<T>,
    logging: LoggingConfig,
}

impl BuildSight<ReqwestTransport> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ReviewClient::from_config(&config.spec.review_config),
            RepoClient::from_config(&config.spec.repo_config),
            config.spec.build_config.logging_config,
        )
    }
}

impl<T: HttpTransport> BuildSight<T> {
    pub fn new(review: ReviewClient<T>, repo: RepoClient<T>, logging: LoggingConfig) -> Self {
        Self { review, repo, logging }
    }

    async fn repo_info(&self, gerrit: &GerritTrigger, revision: &str) -> Result<RepoInfo, SightError> {
        let commit = self.repo.commit(&gerrit.project, revision).await?;
        Ok(RepoInfo {
            project: gerrit.project.clone(),
            branch: gerrit.branch.clone(),
            commit: commit.commit,
            committer: commit.committer.display(),
            author: commit.author.display(),
            message: commit.message,
            date: commit.committer.time,
        })
    }

    async fn review_info(&self, change: i64) -> Result<ReviewInfo, SightError> {
        let detail = self.review.detail(change).await?;
        let uploader = detail
            .current()
            .map(|(_, rev)| rev)
            .or_else(|| detail.revisions.values().next())
            .and_then(|rev| rev.uploader.as_ref())
            .map(|a| a.display())
            .unwrap_or_default();
        Ok(ReviewInfo {
            project: detail.project,
            branch: detail.branch,
            change: detail.number,
            owner: detail.owner.map(|o| o.display()).unwrap_or_default(),
            author: uploader,
            message: detail.subject,
            date: detail.updated,
        })
    }

    async fn steps(
        &self,
        trigger: &BuildTrigger,
        scan: &LogScan,
        info: &mut BuildInfo,
        cancel: &CancellationToken,
    ) -> Result<(), SightError> {
        let gerrit = &trigger.gerrit_trigger;
        if let Some(revision) = gerrit.revision() {
            info.repo_info = guarded(cancel, self.repo_info(gerrit, revision)).await?;
        }
        if let Some(change) = gerrit.change() {
            info.review_info = guarded(cancel, self.review_info(change)).await?;
        }

        let findings = scan.findings();
        if let (false, Some(revision)) = (findings.is_empty(), gerrit.revision()) {
            if cancel.is_cancelled() {
                return Err(SightError::Canceled);
            }
            let vote = guarded(cancel, self.review.vote(revision, &findings).map_err(SightError::from)).await?;
            tracing::info!(change = vote.change, vote = %vote.value(), findings = findings.len(), "build review posted");
        }
        Ok(())
    }
}

/// Notification for the change owner when the log shows trouble.
fn mail(gerrit: &GerritTrigger, scan: &LogScan) -> Option<MailInfo> {
    let to = gerrit.change_owner_email.trim();
    if scan.is_empty() || to.is_empty() {
        return None;
    }
    let subject = match gerrit.change() {
        Some(change) => format!("Build failed: {} change {}", gerrit.project, change),
        None => format!("Build failed: {}", gerrit.project),
    };
    Some(MailInfo { to: vec![to.to_string()], subject, content: scan.detail() })
}

#[async_trait]
impl<T: HttpTransport> Sight for BuildSight<T> {
    type Trigger = BuildTrigger;
    type Info = BuildInfo;

    fn name(&self) -> &'static str {
        "build"
    }

    async fn run(&self, trigger: &BuildTrigger, cancel: &CancellationToken) -> Outcome<BuildInfo> {
        let scan = LogScan::new(&trigger.logging_trigger, &self.logging);
        let mut info = BuildInfo { logging_info: scan.info(), ..Default::default() };
        tracing::info!(diagnostics = scan.diagnostics.len(), "build log scanned");

        let mail = mail(&trigger.gerrit_trigger, &scan);
        match self.steps(trigger, &scan, &mut info, cancel).await {
            Ok(()) => Outcome::ok(info).with_mail(mail),
            Err(error) => {
                tracing::warn!(error = %error, "build sight failed");
                Outcome::failed(info, error).with_mail(mail)
            }
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
