// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review (Gerrit) server connector.
//!
//! Fetches a commit's change, files and patch, and posts a single
//! vote-with-comments once findings have been matched against the diff.

mod classify;
mod types;

pub use classify::{classify, in_scope, strip_binary_sections, Comments, APPROVE_MESSAGE, LABEL, REJECT_MESSAGE};
pub use types::{AccountInfo, ChangeInfo, CommentInput, DiffContent, DiffInfo, FileInfo, ReviewInput, RevisionInfo};

use crate::http::{Credentials, HttpError, HttpTransport, ReqwestTransport};
use base64::Engine;
use insight_core::envelope::decode;
use insight_core::{
    parse_multi_file, ChangedFile, Changeset, DecodeError, DiffParseError, ErrorKind, FileStatus, Finding,
    ReviewConfig, COMMIT_MSG,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Page size requested from `/changes/`.
pub const QUERY_LIMIT: usize = 1000;

/// Options for a general change query.
pub const QUERY_OPTIONS: &[&str] = &["CURRENT_FILES", "CURRENT_REVISION", "DETAILED_ACCOUNTS"];

/// File name the commit message is stored under by [`ReviewClient::fetch`].
pub const MESSAGE_FILE: &str = "message.base64";

/// Unreserved characters survive; everything else is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

const PATH_SEGMENT: &AsciiSet = &QUERY_COMPONENT
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b':')
    .remove(b'@');

/// Escape for a query component: space becomes `+`, `/` becomes `%2F`.
pub fn query_escape(text: &str) -> String {
    utf8_percent_encode(text, QUERY_COMPONENT).to_string().replace("%20", "+")
}

/// Escape for a single path segment: `/` becomes `%2F`, space `%20`.
pub fn path_escape(text: &str) -> String {
    utf8_percent_encode(text, PATH_SEGMENT).to_string()
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("invalid patch: {0}")]
    Diff(#[from] DiffParseError),
    #[error("patch has no diff --git section")]
    NoDiff,
    #[error("no change found for commit {commit}")]
    NotFound { commit: String },
    #[error("path {path} escapes the change directory")]
    UnsafePath { path: String },
    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
}

impl ReviewError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReviewError::Http(e) => e.kind(),
            ReviewError::Decode(_)
            | ReviewError::Diff(_)
            | ReviewError::NoDiff
            | ReviewError::NotFound { .. }
            | ReviewError::UnsafePath { .. } => ErrorKind::Decode,
            ReviewError::Io { .. } => ErrorKind::Io,
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReviewError + '_ {
    move |source| ReviewError::Io { path: path.to_path_buf(), source }
}

/// Removes a directory tree when dropped, unless released.
#[derive(Debug)]
pub struct ScratchDir {
    path: Option<PathBuf>,
}

impl ScratchDir {
    pub fn new(path: &Path) -> Self {
        Self { path: Some(path.to_path_buf()) }
    }

    /// Keep the directory.
    pub fn release(mut self) {
        self.path = None;
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "scratch cleanup failed"),
            }
        }
    }
}

/// A changeset materialized on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    /// `root/<change>/<revision>`
    pub path: PathBuf,
    pub project: String,
    pub change: i64,
    pub revision: String,
    /// Stored files in path order, relative to `path`.
    pub files: Vec<FetchedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    /// Path as the server names it (`/COMMIT_MSG` for the message).
    pub source: String,
    /// `<dir>/<basename>.base64`, or `message.base64`.
    pub stored: String,
}

/// Result of a posted review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub change: i64,
    pub revision: String,
    pub input: ReviewInput,
}

impl Vote {
    /// `"+1"` or `"-1"`.
    pub fn value(&self) -> &str {
        self.input.value()
    }
}

/// Resolved revision of a change.
struct Located {
    change: ChangeInfo,
    revision: String,
    revision_number: i64,
}

#[derive(Clone, Debug)]
pub struct ReviewClient<T: HttpTransport = ReqwestTransport> {
    transport: T,
    url: String,
    auth: Option<Credentials>,
}

impl ReviewClient<ReqwestTransport> {
    pub fn from_config(config: &ReviewConfig) -> Self {
        Self::new(ReqwestTransport::default(), &config.url, &config.user, &config.pass)
    }
}

impl<T: HttpTransport> ReviewClient<T> {
    pub fn new(transport: T, url: &str, user: &str, pass: &str) -> Self {
        Self { transport, url: url.trim_end_matches('/').to_string(), auth: Credentials::new(user, pass) }
    }

    /// Base for REST paths; authenticated access lives under `/a`.
    fn base(&self) -> String {
        match self.auth {
            Some(_) => format!("{}/a", self.url),
            None => self.url.clone(),
        }
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>, ReviewError> {
        Ok(self.transport.get(url, self.auth.as_ref()).await?)
    }

    /// Remove a scratch directory and everything below it.
    pub fn clean(&self, path: &Path) -> Result<(), ReviewError> {
        match std::fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(path)(e)),
        }
    }

    /// Every change matching `search`, following `_more_changes` paging.
    pub async fn query(&self, search: &str, start: usize) -> Result<Vec<ChangeInfo>, ReviewError> {
        self.query_with(search, QUERY_OPTIONS, start).await
    }

    async fn query_with(&self, search: &str, options: &[&str], start: usize) -> Result<Vec<ChangeInfo>, ReviewError> {
        let options: String = options.iter().map(|o| format!("&o={}", o)).collect();
        let mut changes = Vec::new();
        let mut start = start;
        loop {
            let url = format!(
                "{}/changes/?q={}{}&start={}&n={}",
                self.base(),
                path_escape(search),
                options,
                start,
                QUERY_LIMIT
            );
            let page: Vec<ChangeInfo> = decode(&self.get(&url).await?)?;
            let more = page.last().is_some_and(|c| c.more_changes);
            if !more {
                changes.extend(page);
                break;
            }
            start += page.len();
            changes.extend(page);
        }
        tracing::debug!(%search, count = changes.len(), "review query");
        Ok(changes)
    }

    pub async fn detail(&self, change: i64) -> Result<ChangeInfo, ReviewError> {
        let url = format!("{}/changes/{}/detail", self.base(), change);
        Ok(decode(&self.get(&url).await?)?)
    }

    /// Server-side diff of one file against the current revision.
    pub async fn diff(&self, change: i64, file: &str) -> Result<DiffInfo, ReviewError> {
        let url = format!("{}/changes/{}/revisions/current/files/{}/diff", self.base(), change, path_escape(file));
        Ok(decode(&self.get(&url).await?)?)
    }

    async fn locate(&self, commit: &str) -> Result<Located, ReviewError> {
        let changes = self.query_with(&format!("commit:{}", commit), &["CURRENT_REVISION"], 0).await?;
        let change = changes.into_iter().next().ok_or_else(|| ReviewError::NotFound { commit: commit.to_string() })?;
        let (revision, revision_number) = match change.current() {
            Some((hash, rev)) => (hash.to_string(), rev.number),
            None => return Err(DecodeError::Missing { path: ".current_revision".into() }.into()),
        };
        Ok(Located { change, revision, revision_number })
    }

    async fn files(&self, at: &Located) -> Result<Vec<ChangedFile>, ReviewError> {
        let url = format!("{}/changes/{}/revisions/{}/files/", self.base(), at.change.number, at.revision_number);
        let files: BTreeMap<String, FileInfo> = decode(&self.get(&url).await?)?;
        Ok(files
            .into_iter()
            .map(|(path, info)| ChangedFile { status: FileStatus::from_code(info.status.as_deref()), path })
            .filter(|f| f.status.is_materialized())
            .collect())
    }

    /// Base64 body of one file, as the server returns it.
    async fn content(&self, at: &Located, file: &str) -> Result<String, ReviewError> {
        let url = format!(
            "{}/changes/{}/revisions/{}/files/{}/content",
            self.base(),
            at.change.number,
            at.revision_number,
            query_escape(file)
        );
        Ok(String::from_utf8_lossy(&self.get(&url).await?).trim().to_string())
    }

    async fn patch(&self, at: &Located) -> Result<String, ReviewError> {
        let url = format!("{}/changes/{}/revisions/{}/patch", self.base(), at.change.number, at.revision_number);
        Ok(String::from_utf8_lossy(&self.get(&url).await?).trim().to_string())
    }

    /// Everything the server knows about the change behind `commit`.
    pub async fn changeset(&self, commit: &str) -> Result<Changeset, ReviewError> {
        let at = self.locate(commit).await?;
        let files = self.files(&at).await?;
        let mut contents = BTreeMap::new();
        for file in &files {
            contents.insert(file.path.clone(), self.content(&at, &file.path).await?);
        }
        let patch = self.patch(&at).await?;
        Ok(Changeset {
            change_number: at.change.number,
            revision_number: at.revision_number,
            project: at.change.project,
            current_revision: at.revision,
            files,
            contents,
            patch,
        })
    }

    /// Store one base64 file per changed file under
    /// `root/<change>/<revision>/`, the commit message as `message.base64`.
    ///
    /// Every server-supplied name is checked before anything is written. A
    /// failed or dropped download removes the revision directory again.
    pub async fn fetch(&self, root: &Path, commit: &str) -> Result<Fetched, ReviewError> {
        let at = self.locate(commit).await?;
        if !is_relative_name(&at.revision) || at.revision.contains('/') {
            return Err(ReviewError::UnsafePath { path: at.revision });
        }
        let files = self
            .files(&at)
            .await?
            .into_iter()
            .map(|file| Ok(FetchedFile { stored: stored_name(&file.path)?, source: file.path }))
            .collect::<Result<Vec<_>, ReviewError>>()?;

        let path = root.join(at.change.number.to_string()).join(&at.revision);
        std::fs::create_dir_all(&path).map_err(io_error(&path))?;
        let scratch = ScratchDir::new(&path);
        self.store(&at, &path, &files).await?;
        scratch.release();

        tracing::info!(change = at.change.number, revision = %at.revision, files = files.len(), "fetched change");
        Ok(Fetched { path, project: at.change.project, change: at.change.number, revision: at.revision, files })
    }

    async fn store(&self, at: &Located, path: &Path, files: &[FetchedFile]) -> Result<(), ReviewError> {
        for file in files {
            let body = self.content(at, &file.source).await?;
            let target = path.join(&file.stored);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(io_error(parent))?;
            }
            std::fs::write(&target, body).map_err(io_error(&target))?;
        }
        Ok(())
    }

    /// Match `findings` against the change's diff and post one review.
    pub async fn vote(&self, commit: &str, findings: &[Finding]) -> Result<Vote, ReviewError> {
        let at = self.locate(commit).await?;
        let patch = decode_base64(&self.patch(&at).await?)?;
        let text = strip_binary_sections(&patch).ok_or(ReviewError::NoDiff)?;
        let diffs = parse_multi_file(&text)?;

        let input = ReviewInput::from_comments(classify(&diffs, findings));
        let body = serde_json::to_vec(&input).map_err(DecodeError::from)?;
        let url = format!("{}/changes/{}/revisions/{}/review", self.base(), at.change.number, at.revision_number);
        self.transport.post_json(&url, self.auth.as_ref(), body).await?;

        tracing::info!(change = at.change.number, revision = %at.revision, vote = %input.value(), "posted review");
        Ok(Vote { change: at.change.number, revision: at.revision, input })
    }
}

fn stored_name(file: &str) -> Result<String, ReviewError> {
    if file == COMMIT_MSG {
        return Ok(MESSAGE_FILE.to_string());
    }
    let relative = file.trim_start_matches('/');
    if !is_relative_name(relative) {
        return Err(ReviewError::UnsafePath { path: file.to_string() });
    }
    Ok(format!("{}.base64", relative))
}

/// Non-empty and made only of plain components: no `..`, `.` or root.
fn is_relative_name(name: &str) -> bool {
    !name.is_empty() && Path::new(name).components().all(|c| matches!(c, Component::Normal(_)))
}

fn decode_base64(body: &str) -> Result<String, ReviewError> {
    let compact: Vec<u8> = body.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
