// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Matching linter findings against a change's diff.

use super::types::{CommentInput, ReviewInput};
use insight_core::{FileDiff, Finding, COMMIT_MSG};
use std::collections::BTreeMap;

const GIT_HEADER: &str = "diff --git ";

pub const LABEL: &str = "Code-Review";
pub const APPROVE_MESSAGE: &str = "Voting Code-Review +1 by pipeflow insight";
pub const REJECT_MESSAGE: &str = "Voting Code-Review -1 by pipeflow insight";

/// Comments grouped by file, in finding order within each file.
pub type Comments = BTreeMap<String, Vec<CommentInput>>;

/// Drop every `diff --git` section describing a binary file.
///
/// Anything before the first section header (the mail header of a
/// format-patch) is discarded. Returns `None` when there is no section
/// header at all.
pub fn strip_binary_sections(patch: &str) -> Option<String> {
    let start = if patch.starts_with(GIT_HEADER) {
        0
    } else {
        patch.find(&format!("\n{}", GIT_HEADER))? + 1
    };
    let body = &patch[start..];

    let mut bounds = vec![0];
    bounds.extend(body.match_indices(&format!("\n{}", GIT_HEADER)).map(|(i, _)| i + 1));
    bounds.push(body.len());

    Some(
        bounds
            .windows(2)
            .map(|w| &body[w[0]..w[1]])
            .filter(|section| !is_binary_section(section))
            .collect(),
    )
}

fn is_binary_section(section: &str) -> bool {
    section.lines().any(|line| {
        line.contains("Binary files differ")
            || (line.starts_with("Binary files ") && line.ends_with(" differ"))
            || line == "GIT binary patch"
    })
}

/// Whether a finding may be posted against this diff.
///
/// The commit message is always in scope. Other files must appear on the
/// new side; line-anchored findings also need an added line at that number.
pub fn in_scope(diffs: &[FileDiff], finding: &Finding) -> bool {
    if finding.file == COMMIT_MSG {
        return true;
    }
    diffs
        .iter()
        .find(|d| d.path_new.strip_prefix("b/").unwrap_or(&d.path_new) == finding.file)
        .is_some_and(|d| finding.line == 0 || d.has_added_line(finding.line))
}

pub fn classify(diffs: &[FileDiff], findings: &[Finding]) -> Comments {
    let mut comments = Comments::new();
    for finding in findings.iter().filter(|f| !f.message.is_empty()) {
        if !in_scope(diffs, finding) {
            tracing::debug!(file = %finding.file, line = finding.line, "finding outside diff, dropped");
            continue;
        }
        comments
            .entry(finding.file.clone())
            .or_default()
            .push(CommentInput { line: finding.line.max(1), message: finding.message.clone() });
    }
    comments
}

impl ReviewInput {
    /// +1 with no comments when nothing is in scope, -1 with them otherwise.
    pub fn from_comments(comments: Comments) -> Self {
        let approve = comments.is_empty();
        let (message, value) = if approve { (APPROVE_MESSAGE, "+1") } else { (REJECT_MESSAGE, "-1") };
        Self {
            message: message.to_string(),
            labels: BTreeMap::from([(LABEL.to_string(), value.to_string())]),
            comments: (!approve).then_some(comments),
        }
    }

    pub fn value(&self) -> &str {
        self.labels.get(LABEL).map(String::as_str).unwrap_or_default()
    }

    pub fn approves(&self) -> bool {
        self.value() == "+1"
    }
}

#[cfg(test)]
#[path = "classify_tests.rs"]
mod tests;
