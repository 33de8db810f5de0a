// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prose generation through a chat-completion HTTP service.

use crate::http::{Credentials, HttpError, HttpTransport, ReqwestTransport};
use async_trait::async_trait;
use insight_core::{ErrorKind, GptConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Whole-request timeout for the chat service.
pub const GPT_TIMEOUT: Duration = Duration::from_secs(100);

#[derive(Debug, Error)]
pub enum GptError {
    #[error("gpt service is not configured")]
    Unavailable,
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("gpt service returned code {code}: {msg}")]
    Service { code: i64, msg: String },
    #[error("invalid gpt response: {0}")]
    Decode(String),
}

impl GptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GptError::Unavailable | GptError::Service { .. } => ErrorKind::Execution,
            GptError::Http(e) => e.kind(),
            GptError::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Adapter for prose generation
#[async_trait]
pub trait GptAdapter: Clone + Send + Sync + 'static {
    /// Send one prompt and return the generated text
    async fn chat(&self, content: &str) -> Result<String, GptError>;

    /// Whether a service is behind this adapter at all
    fn available(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    ret: serde_json::Value,
}

/// Chat service reached over HTTP: `POST {"content": ...}` answered by
/// `{"code": 0, "msg": "", "ret": "<text>"}`.
#[derive(Clone, Debug)]
pub struct HttpGptAdapter<T: HttpTransport = ReqwestTransport> {
    transport: T,
    url: String,
    auth: Option<Credentials>,
}

impl HttpGptAdapter<ReqwestTransport> {
    pub fn from_config(config: &GptConfig) -> Self {
        Self::new(ReqwestTransport::new(Some(GPT_TIMEOUT)), &config.url, &config.user, &config.pass)
    }
}

impl<T: HttpTransport> HttpGptAdapter<T> {
    pub fn new(transport: T, url: &str, user: &str, pass: &str) -> Self {
        Self { transport, url: url.to_string(), auth: Credentials::new(user, pass) }
    }
}

#[async_trait]
impl<T: HttpTransport> GptAdapter for HttpGptAdapter<T> {
    async fn chat(&self, content: &str) -> Result<String, GptError> {
        if self.url.is_empty() {
            return Err(GptError::Unavailable);
        }
        let body = serde_json::to_vec(&ChatRequest { content })
            .map_err(|e| GptError::Decode(e.to_string()))?;
        let raw = self.transport.post_json(&self.url, self.auth.as_ref(), body).await?;
        let response: ChatResponse =
            serde_json::from_slice(&raw).map_err(|e| GptError::Decode(e.to_string()))?;
        if response.code != 0 {
            return Err(GptError::Service { code: response.code, msg: response.msg });
        }
        match response.ret {
            serde_json::Value::String(text) => Ok(text),
            other => Err(GptError::Decode(format!("ret is not a string: {}", other))),
        }
    }

    fn available(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Stand-in used when no chat service is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopGptAdapter;

#[async_trait]
impl GptAdapter for NoopGptAdapter {
    async fn chat(&self, _content: &str) -> Result<String, GptError> {
        Err(GptError::Unavailable)
    }

    fn available(&self) -> bool {
        false
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{GptAdapter, GptError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::time::Duration;

    /// Recorded prompt
    #[derive(Debug, Clone)]
    pub struct GptCall {
        pub content: String,
    }

    #[derive(Default)]
    struct FakeGptState {
        reply: Option<String>,
        rules: Vec<(String, String)>,
        calls: Vec<GptCall>,
        delay: Option<Duration>,
    }

    /// Fake chat service. Prompts containing a registered needle get that
    /// reply, others get the default reply; without one every call fails.
    #[derive(Clone, Default)]
    pub struct FakeGptAdapter {
        inner: Arc<Mutex<FakeGptState>>,
    }

    impl FakeGptAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn replying(reply: impl Into<String>) -> Self {
            let fake = Self::default();
            fake.inner.lock().reply = Some(reply.into());
            fake
        }

        pub fn on_prompt(&self, needle: impl Into<String>, reply: impl Into<String>) -> &Self {
            self.inner.lock().rules.push((needle.into(), reply.into()));
            self
        }

        /// Hold every reply for `delay`, like a slow service.
        pub fn delayed(&self, delay: Duration) -> &Self {
            self.inner.lock().delay = Some(delay);
            self
        }

        /// Get all recorded prompts
        pub fn calls(&self) -> Vec<GptCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl GptAdapter for FakeGptAdapter {
        async fn chat(&self, content: &str) -> Result<String, GptError> {
            let delay = {
                let mut inner = self.inner.lock();
                inner.calls.push(GptCall { content: content.to_string() });
                inner.delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let inner = self.inner.lock();
            if let Some((_, reply)) = inner.rules.iter().find(|(needle, _)| content.contains(needle.as_str())) {
                return Ok(reply.clone());
            }
            inner.reply.clone().ok_or_else(|| GptError::Service { code: 1, msg: "no reply scripted".into() })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGptAdapter, GptCall};

#[cfg(test)]
#[path = "gpt_tests.rs"]
mod tests;
