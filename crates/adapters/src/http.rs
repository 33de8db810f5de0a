// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport shared by the review, repository and GPT clients.

use async_trait::async_trait;
use insight_core::ErrorKind;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::time::Duration;
use thiserror::Error;

/// Content type the review server expects on POST bodies.
pub const JSON_UTF8: &str = "application/json;charset=utf-8";

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16, body: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
}

impl HttpError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Http
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Basic-auth credentials. Both halves must be non-empty to be used.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub pass: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Option<Self> {
        let (user, pass) = (user.into(), pass.into());
        (!user.is_empty() && !pass.is_empty()).then_some(Self { user, pass })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials").field("user", &self.user).finish_non_exhaustive()
    }
}

/// Request/response transport; every non-200 status is an error.
#[async_trait]
pub trait HttpTransport: Clone + Send + Sync + 'static {
    async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<Vec<u8>, HttpError>;

    async fn post_json(
        &self,
        url: &str,
        auth: Option<&Credentials>,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError>;
}

/// Transport over a pooled `reqwest::Client`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// `timeout` bounds each whole request; `None` relies on the caller's deadline.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default http client");
            reqwest::Client::new()
        });
        Self { client }
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<Vec<u8>, HttpError> {
        let response = request.send().await.map_err(|e| map_reqwest(url, e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| map_reqwest(url, e))?;
        if status.as_u16() != 200 {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).chars().take(512).collect(),
            });
        }
        Ok(body.to_vec())
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(None)
    }
}

fn map_reqwest(url: &str, e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout { url: url.to_string() }
    } else {
        HttpError::Transport { url: url.to_string(), reason: e.to_string() }
    }
}

fn with_auth(request: reqwest::RequestBuilder, auth: Option<&Credentials>) -> reqwest::RequestBuilder {
    match auth {
        Some(c) => request.basic_auth(&c.user, Some(&c.pass)),
        None => request,
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<Vec<u8>, HttpError> {
        tracing::debug!(%url, "http get");
        self.send(url, with_auth(self.client.get(url), auth)).await
    }

    async fn post_json(
        &self,
        url: &str,
        auth: Option<&Credentials>,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError> {
        tracing::debug!(%url, bytes = body.len(), "http post");
        let request = with_auth(self.client.post(url), auth)
            .header(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8))
            .body(body);
        self.send(url, request).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Credentials, HttpError, HttpTransport};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Method {
        Get,
        Post,
    }

    /// Recorded request
    #[derive(Debug, Clone)]
    pub struct HttpCall {
        pub method: Method,
        pub url: String,
        pub authed: bool,
        pub body: Vec<u8>,
    }

    impl HttpCall {
        pub fn body_json(&self) -> serde_json::Value {
            serde_json::from_slice(&self.body).unwrap_or(serde_json::Value::Null)
        }
    }

    #[derive(Clone)]
    enum Route {
        Ok(Vec<u8>),
        Status(u16),
    }

    #[derive(Default)]
    struct FakeTransportState {
        routes: HashMap<(Method, String), Route>,
        calls: Vec<HttpCall>,
    }

    /// Fake transport answering from exact-URL routes. Unrouted URLs get 404.
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        inner: Arc<Mutex<FakeTransportState>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn on_get(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> &Self {
            self.inner.lock().routes.insert((Method::Get, url.into()), Route::Ok(body.into()));
            self
        }

        pub fn on_post(&self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> &Self {
            self.inner.lock().routes.insert((Method::Post, url.into()), Route::Ok(body.into()));
            self
        }

        pub fn fail(&self, method: Method, url: impl Into<String>, status: u16) -> &Self {
            self.inner.lock().routes.insert((method, url.into()), Route::Status(status));
            self
        }

        /// Get all recorded requests
        pub fn calls(&self) -> Vec<HttpCall> {
            self.inner.lock().calls.clone()
        }

        pub fn posts(&self) -> Vec<HttpCall> {
            self.calls().into_iter().filter(|c| c.method == Method::Post).collect()
        }

        fn answer(
            &self,
            method: Method,
            url: &str,
            auth: Option<&Credentials>,
            body: Vec<u8>,
        ) -> Result<Vec<u8>, HttpError> {
            let mut inner = self.inner.lock();
            inner.calls.push(HttpCall { method, url: url.to_string(), authed: auth.is_some(), body });
            match inner.routes.get(&(method, url.to_string())) {
                Some(Route::Ok(body)) => Ok(body.clone()),
                Some(Route::Status(status)) => {
                    Err(HttpError::Status { url: url.to_string(), status: *status, body: String::new() })
                }
                None => Err(HttpError::Status { url: url.to_string(), status: 404, body: String::new() }),
            }
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(&self, url: &str, auth: Option<&Credentials>) -> Result<Vec<u8>, HttpError> {
            self.answer(Method::Get, url, auth, Vec::new())
        }

        async fn post_json(
            &self,
            url: &str,
            auth: Option<&Credentials>,
            body: Vec<u8>,
        ) -> Result<Vec<u8>, HttpError> {
            self.answer(Method::Post, url, auth, body)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, HttpCall, Method};

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
