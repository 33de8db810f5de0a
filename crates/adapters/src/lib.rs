// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! insight-adapters: clients for the systems the plugin talks to.
//!
//! Each external seam (SSH, HTTP, GPT) is an `#[async_trait]` adapter with
//! a production implementation and a recording fake behind `test-support`.

pub mod gpt;
pub mod http;
pub mod repo;
pub mod review;
pub mod ssh;
pub mod subprocess;

pub use gpt::{GptAdapter, GptError, HttpGptAdapter, NoopGptAdapter};
pub use http::{Credentials, HttpError, HttpTransport, ReqwestTransport};
pub use repo::{CommitRecord, Operator, RepoClient, RepoError};
pub use review::{Fetched, FetchedFile, ReviewClient, ReviewError, ReviewInput, ScratchDir, Vote};
pub use ssh::{Ssh2Adapter, SshAdapter, SshAuth, SshError, SshTarget};

#[cfg(any(test, feature = "test-support"))]
pub use gpt::{FakeGptAdapter, GptCall};
#[cfg(any(test, feature = "test-support"))]
pub use http::{FakeTransport, HttpCall, Method};
#[cfg(any(test, feature = "test-support"))]
pub use ssh::{FakeSshAdapter, SshCall};
