// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unified multi-file diff parser.
//!
//! Accepts git-style patches (`diff --git` headers, extended header lines,
//! `---`/`+++` file lines, `@@` hunks) as well as plain unified diffs
//! without a git header. Paths are kept verbatim, prefixes included, so a
//! new-side path reads `b/src/main.c`.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GIT_HEADER: &str = "diff --git ";
const NO_NEWLINE: char = '\\';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffParseError {
    #[error("line {line}: invalid hunk header {header:?}")]
    HunkHeader { line: usize, header: String },
    #[error("line {line}: hunk outside of a file section")]
    Orphan { line: usize },
    #[error("line {line}: unexpected {text:?} inside hunk")]
    Unexpected { line: usize, text: String },
    #[error("hunk at line {line} ends before its declared length")]
    Truncated { line: usize },
}

impl DiffParseError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Decode
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Context,
    Added,
    Removed,
}

/// One body line of a hunk. Line numbers are 1-based; the side a line
/// does not exist on carries 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub lnum_old: u32,
    pub lnum_new: u32,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub start_old: u32,
    pub len_old: u32,
    pub start_new: u32,
    pub len_new: u32,
    /// Text after the closing `@@`, usually the enclosing function.
    pub section: String,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    pub path_old: String,
    pub path_new: String,
    /// Extended header lines (`index`, `new file mode`, `Binary files ...`).
    pub extended: Vec<String>,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Whether the new side has an added line numbered `lnum`.
    pub fn has_added_line(&self, lnum: u32) -> bool {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .any(|l| l.kind == LineKind::Added && l.lnum_new == lnum)
    }

    pub fn is_binary(&self) -> bool {
        self.extended.iter().any(|l| l.starts_with("Binary files ") || l == "GIT binary patch")
    }

    fn from_git_header(rest: &str) -> Self {
        let (old, new) = match rest.rfind(" b/") {
            Some(idx) => (rest[..idx].to_string(), rest[idx + 1..].to_string()),
            None => match rest.split_once(' ') {
                Some((o, n)) => (o.to_string(), n.to_string()),
                None => (rest.to_string(), rest.to_string()),
            },
        };
        FileDiff { path_old: old, path_new: new, ..Default::default() }
    }
}

/// Parse every file section of a unified diff.
pub fn parse_multi_file(text: &str) -> Result<Vec<FileDiff>, DiffParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if let Some(rest) = line.strip_prefix(GIT_HEADER) {
            files.extend(current.take());
            current = Some(FileDiff::from_git_header(rest));
            i += 1;
            continue;
        }

        if let (Some(old), Some(new)) = (
            line.strip_prefix("--- "),
            lines.get(i + 1).and_then(|next| next.strip_prefix("+++ ")),
        ) {
            // A second ---/+++ pair after hunks starts a file in a diff without git headers
            let file = match current.take() {
                Some(file) if file.hunks.is_empty() => file,
                Some(done) => {
                    files.push(done);
                    FileDiff::default()
                }
                None => FileDiff::default(),
            };
            current = Some(FileDiff { path_old: strip_timestamp(old), path_new: strip_timestamp(new), ..file });
            i += 2;
            continue;
        }

        if let Some(header) = line.strip_prefix("@@ ") {
            let file = current.as_mut().ok_or(DiffParseError::Orphan { line: i + 1 })?;
            let (hunk, consumed) = parse_hunk(&lines, i, header)?;
            file.hunks.push(hunk);
            i += consumed;
            continue;
        }

        if let Some(file) = current.as_mut() {
            if file.hunks.is_empty() && !line.is_empty() {
                file.extended.push(line.to_string());
            }
        }
        i += 1;
    }

    files.extend(current);
    Ok(files)
}

/// Parse a hunk whose header sits at `lines[start]`. Returns the hunk and
/// the number of lines consumed, header included.
fn parse_hunk(lines: &[&str], start: usize, header: &str) -> Result<(Hunk, usize), DiffParseError> {
    let bad_header = || DiffParseError::HunkHeader { line: start + 1, header: header.to_string() };

    let (ranges, section) = header.split_once("@@").ok_or_else(bad_header)?;
    let mut parts = ranges.split_whitespace();
    let old = parts.next().and_then(|p| p.strip_prefix('-')).ok_or_else(bad_header)?;
    let new = parts.next().and_then(|p| p.strip_prefix('+')).ok_or_else(bad_header)?;
    let (start_old, len_old) = parse_range(old).ok_or_else(bad_header)?;
    let (start_new, len_new) = parse_range(new).ok_or_else(bad_header)?;

    let mut hunk = Hunk {
        start_old,
        len_old,
        start_new,
        len_new,
        section: section.trim().to_string(),
        lines: Vec::new(),
    };

    let mut old_left = len_old;
    let mut new_left = len_new;
    let mut lnum_old = start_old;
    let mut lnum_new = start_new;
    let mut i = start + 1;

    while old_left > 0 || new_left > 0 {
        let raw = *lines.get(i).ok_or(DiffParseError::Truncated { line: start + 1 })?;
        let mut chars = raw.chars();
        let (kind, text) = match chars.next() {
            Some(' ') | None => (LineKind::Context, chars.as_str()),
            Some('+') => (LineKind::Added, chars.as_str()),
            Some('-') => (LineKind::Removed, chars.as_str()),
            Some(NO_NEWLINE) => {
                i += 1;
                continue;
            }
            Some(_) => {
                return Err(DiffParseError::Unexpected { line: i + 1, text: raw.to_string() });
            }
        };

        let line = match kind {
            LineKind::Context => {
                if old_left == 0 || new_left == 0 {
                    return Err(DiffParseError::Unexpected { line: i + 1, text: raw.to_string() });
                }
                old_left -= 1;
                new_left -= 1;
                lnum_old += 1;
                lnum_new += 1;
                Line { kind, lnum_old: lnum_old - 1, lnum_new: lnum_new - 1, text: text.to_string() }
            }
            LineKind::Added => {
                if new_left == 0 {
                    return Err(DiffParseError::Unexpected { line: i + 1, text: raw.to_string() });
                }
                new_left -= 1;
                lnum_new += 1;
                Line { kind, lnum_old: 0, lnum_new: lnum_new - 1, text: text.to_string() }
            }
            LineKind::Removed => {
                if old_left == 0 {
                    return Err(DiffParseError::Unexpected { line: i + 1, text: raw.to_string() });
                }
                old_left -= 1;
                lnum_old += 1;
                Line { kind, lnum_old: lnum_old - 1, lnum_new: 0, text: text.to_string() }
            }
        };
        hunk.lines.push(line);
        i += 1;
    }

    Ok((hunk, i - start))
}

/// `s,l` or `s` (length 1).
fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((s, l)) => Some((s.parse().ok()?, l.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn strip_timestamp(path: &str) -> String {
    path.split('\t').next().unwrap_or(path).trim_end().to_string()
}

#[cfg(test)]
#[path = "diff_tests.rs"]
mod tests;
