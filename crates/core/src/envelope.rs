// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON envelopes returned by the review and repository servers.
//!
//! Both servers prepend `)]}'` to every JSON body. Known shapes decode
//! straight into typed records; the few open-ended graphs stay as
//! [`serde_json::Value`] and are traversed with [`walk`].

use crate::error::ErrorKind;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub const XSSI_PREFIX: &[u8] = b")]}'";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("response is missing the )]}}' prefix")]
    MissingPrefix,
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid base64: {0}")]
    Base64(String),
    #[error("no element at {path}")]
    Missing { path: String },
    #[error("expected {expected} at {path}")]
    Type { path: String, expected: &'static str },
    #[error("empty result list")]
    Empty,
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Decode
    }
}

/// Strip the XSSI guard; a body without it is rejected.
pub fn strip_xssi(body: &[u8]) -> Result<&[u8], DecodeError> {
    body.strip_prefix(XSSI_PREFIX).ok_or(DecodeError::MissingPrefix)
}

/// Strip the guard and decode into a typed record.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(strip_xssi(body)?)?)
}

/// Strip the guard and decode into an open-ended value.
pub fn decode_value(body: &[u8]) -> Result<Value, DecodeError> {
    decode(body)
}

/// One step into a JSON graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    Key(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for PathSegment<'a> {
    fn from(key: &'a str) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment<'_> {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// Follow `path` into `value`, failing at the first missing element.
pub fn walk<'v>(value: &'v Value, path: &[PathSegment<'_>]) -> Result<&'v Value, DecodeError> {
    let mut current = value;
    let mut seen = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                seen.push('.');
                seen.push_str(key);
                let object = current
                    .as_object()
                    .ok_or_else(|| DecodeError::Type { path: seen.clone(), expected: "object" })?;
                current = object.get(*key).ok_or_else(|| DecodeError::Missing { path: seen.clone() })?;
            }
            PathSegment::Index(index) => {
                seen.push_str(&format!("[{}]", index));
                let array = current
                    .as_array()
                    .ok_or_else(|| DecodeError::Type { path: seen.clone(), expected: "array" })?;
                current = array.get(*index).ok_or_else(|| DecodeError::Missing { path: seen.clone() })?;
            }
        }
    }
    Ok(current)
}

/// [`walk`] then require a string.
pub fn walk_str<'v>(value: &'v Value, path: &[PathSegment<'_>]) -> Result<&'v str, DecodeError> {
    walk(value, path)?.as_str().ok_or_else(|| DecodeError::Type {
        path: render(path),
        expected: "string",
    })
}

/// [`walk`] then require an integer.
pub fn walk_i64(value: &Value, path: &[PathSegment<'_>]) -> Result<i64, DecodeError> {
    walk(value, path)?.as_i64().ok_or_else(|| DecodeError::Type {
        path: render(path),
        expected: "integer",
    })
}

fn render(path: &[PathSegment<'_>]) -> String {
    path.iter()
        .map(|s| match s {
            PathSegment::Key(k) => format!(".{}", k),
            PathSegment::Index(i) => format!("[{}]", i),
        })
        .collect()
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
