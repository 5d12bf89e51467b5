//! # contract: interface to the git transport
//!
//! The synchroniser never talks to the network itself. Everything that reaches a
//! remote repository goes through the [`GitTransport`] trait, so the strategy logic
//! can be exercised against a `mockall` mock and the shipped implementation
//! ([`crate::git::GitCli`]) can be swapped for another client.
//!
//! Credentials are pulled, not pushed: the request carries a [`CredentialCallback`]
//! that the transport invokes only when it actually needs to authenticate.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::config::{AuthorIdentity, GitAuth, GitSource};
use crate::error::TransportError;

/// Supplies credentials for a remote on demand.
pub type CredentialCallback = Arc<dyn Fn() -> Option<GitAuth> + Send + Sync>;

/// One clone or pull against a remote, targeting a local directory.
#[derive(Clone)]
pub struct FetchRequest {
    pub url: String,
    pub dir: PathBuf,
    pub credentials: CredentialCallback,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
            credentials: Arc::new(|| None),
        }
    }

    /// Build a request whose callback hands out the source's configured auth.
    pub fn for_source(source: &GitSource, dir: impl Into<PathBuf>) -> Self {
        let auth = source.auth.clone();
        Self {
            url: source.repo_url.clone(),
            dir: dir.into(),
            credentials: Arc::new(move || auth.clone()),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialCallback) -> Self {
        self.credentials = credentials;
        self
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("url", &self.url)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Network client able to shallow-clone and fast-forward a single branch.
///
/// Implementations must report authentication problems as
/// [`TransportError::Authentication`] so callers can tell them apart from other failures.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GitTransport: Send + Sync {
    /// Single-branch, depth-1 clone of `request.url` into the (empty) `request.dir`.
    async fn clone_shallow(&self, request: &FetchRequest) -> Result<(), TransportError>;

    /// Fast-forward-only fetch and merge of the checkout at `request.dir`.
    async fn pull_fast_forward(&self, request: &FetchRequest) -> Result<(), TransportError>;

    /// Write the commit identity into the checkout's local configuration.
    async fn set_identity(
        &self,
        dir: &Path,
        author: &AuthorIdentity,
    ) -> Result<(), TransportError>;
}
