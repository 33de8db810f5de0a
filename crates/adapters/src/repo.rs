// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only client for a Gitiles-style repository browser.

use crate::http::{Credentials, HttpError, HttpTransport, ReqwestTransport};
use base64::Engine;
use insight_core::envelope::{decode, decode_value};
use insight_core::{DecodeError, ErrorKind, RepoConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("invalid operator {text:?}: {reason}")]
    InvalidOperator { text: String, reason: &'static str },
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RepoError::InvalidOperator { .. } => ErrorKind::Config,
            RepoError::Http(e) => e.kind(),
            RepoError::Decode(e) => e.kind(),
        }
    }
}

/// Where in a project's history a request points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Branch(String),
    Tag(String),
    Commit(String),
    /// Branch log starting at a commit.
    BranchFrom { branch: String, commit: String },
}

impl Operator {
    /// One `branch:`, `tag:` or `commit:` token, as `get` and `fetch` take.
    pub fn parse_single(text: &str) -> Result<Self, RepoError> {
        let invalid = |reason| RepoError::InvalidOperator { text: text.to_string(), reason };
        match tokens(text)?.as_slice() {
            [(key, value)] => Ok(match *key {
                "branch" => Operator::Branch(value.to_string()),
                "tag" => Operator::Tag(value.to_string()),
                _ => Operator::Commit(value.to_string()),
            }),
            [] => Err(invalid("empty")),
            _ => Err(invalid("expected exactly one token")),
        }
    }

    /// `branch:`, `tag:`, or `branch:` with `commit:`, as `query` takes.
    pub fn parse_query(text: &str) -> Result<Self, RepoError> {
        let invalid = |reason| RepoError::InvalidOperator { text: text.to_string(), reason };
        let parsed = tokens(text)?;
        let find = |key: &str| parsed.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string());
        match (find("branch"), find("tag"), find("commit")) {
            (Some(_), Some(_), _) => Err(invalid("branch and tag are exclusive")),
            (Some(branch), None, Some(commit)) => Ok(Operator::BranchFrom { branch, commit }),
            (Some(branch), None, None) => Ok(Operator::Branch(branch)),
            (None, Some(tag), None) => Ok(Operator::Tag(tag)),
            (None, Some(_), Some(_)) => Err(invalid("commit needs a branch")),
            (None, None, Some(_)) => Err(invalid("commit alone cannot be logged")),
            (None, None, None) => Err(invalid("empty")),
        }
    }

    fn show_path(&self) -> String {
        match self {
            Operator::Branch(b) | Operator::BranchFrom { branch: b, .. } => format!("refs/heads/{}", b),
            Operator::Tag(t) => format!("refs/tags/{}", t),
            Operator::Commit(c) => c.clone(),
        }
    }
}

fn tokens(text: &str) -> Result<Vec<(&str, &str)>, RepoError> {
    let invalid = |reason| RepoError::InvalidOperator { text: text.to_string(), reason };
    let parts: Vec<&str> = text.split_whitespace().collect();
    if parts.len() > 2 {
        return Err(invalid("more than two tokens"));
    }
    let mut out: Vec<(&str, &str)> = Vec::new();
    for part in parts {
        let (key, value) = part.split_once(':').ok_or_else(|| invalid("token is not key:value"))?;
        if !matches!(key, "branch" | "tag" | "commit") {
            return Err(invalid("unknown key"));
        }
        if value.is_empty() {
            return Err(invalid("empty value"));
        }
        if out.iter().any(|(k, _)| *k == key) {
            return Err(invalid("repeated key"));
        }
        out.push((key, value));
    }
    Ok(out)
}

/// Identity stamp on a Gitiles commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub time: String,
}

impl Signature {
    pub fn display(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitRecord {
    pub commit: String,
    pub tree: String,
    pub parents: Vec<String>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct RepoClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    url: String,
    auth: Option<Credentials>,
}

impl RepoClient<ReqwestTransport> {
    pub fn from_config(config: &RepoConfig) -> Self {
        Self::new(ReqwestTransport::default(), &config.url, &config.user, &config.pass)
    }
}

impl<T: HttpTransport> RepoClient<T> {
    pub fn new(transport: T, url: &str, user: &str, pass: &str) -> Self {
        Self { transport, url: url.trim_end_matches('/').to_string(), auth: Credentials::new(user, pass) }
    }

    async fn get_raw(&self, url: String) -> Result<Vec<u8>, RepoError> {
        tracing::debug!(%url, "repo get");
        Ok(self.transport.get(&url, self.auth.as_ref()).await?)
    }

    /// Show one branch head, tag or commit.
    pub async fn get(&self, project: &str, operator: &str) -> Result<Value, RepoError> {
        let op = Operator::parse_single(operator)?;
        let url = format!("{}/{}/+/{}?format=JSON", self.url, project, op.show_path());
        Ok(decode_value(&self.get_raw(url).await?)?)
    }

    /// Log of a branch (optionally from a commit) or a tag.
    pub async fn query(&self, project: &str, operator: &str) -> Result<Value, RepoError> {
        let url = match Operator::parse_query(operator)? {
            Operator::BranchFrom { branch, commit } => {
                format!("{}/{}/+log/refs/heads/{}/?s={}&format=JSON", self.url, project, branch, commit)
            }
            op => format!("{}/{}/+log/{}?format=JSON", self.url, project, op.show_path()),
        };
        Ok(decode_value(&self.get_raw(url).await?)?)
    }

    /// Raw bytes of `file` at the operator's revision.
    pub async fn fetch(&self, project: &str, file: &str, operator: &str) -> Result<Vec<u8>, RepoError> {
        let op = Operator::parse_single(operator)?;
        let url = format!("{}/{}/+/{}/{}?format=TEXT", self.url, project, op.show_path(), file);
        let body = self.get_raw(url).await?;
        let compact: Vec<u8> = body.into_iter().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| DecodeError::Base64(e.to_string()).into())
    }

    /// Typed view of `get(project, "commit:<rev>")`.
    pub async fn commit(&self, project: &str, revision: &str) -> Result<CommitRecord, RepoError> {
        let op = Operator::parse_single(&format!("commit:{}", revision))?;
        let url = format!("{}/{}/+/{}?format=JSON", self.url, project, op.show_path());
        Ok(decode(&self.get_raw(url).await?)?)
    }
}

#[cfg(test)]
#[path = "repo_tests.rs"]
mod tests;
