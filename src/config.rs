use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

pub const DEFAULT_AUTHOR_NAME: &str = "Markdown Transport";
pub const DEFAULT_AUTHOR_EMAIL: &str = "markdown-transport@example.com";

/// Where content comes from: a local directory, a git repository, or both
/// (the git source wins when present).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub content_dir: Option<PathBuf>,
    #[serde(default)]
    pub git: Option<GitSource>,
    /// File extensions (without the dot) treated as content.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    vec!["md".to_string()]
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            content_dir: None,
            git: None,
            extensions: default_extensions(),
        }
    }
}

impl TransportConfig {
    /// Config reading a local directory only.
    pub fn local(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: Some(content_dir.into()),
            ..Self::default()
        }
    }

    /// Config mirroring a git repository.
    pub fn remote(git: GitSource) -> Self {
        Self {
            git: Some(git),
            ..Self::default()
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            content_dir = ?self.content_dir,
            git = self.git.is_some(),
            extensions = ?self.extensions,
            "Loaded TransportConfig"
        );
        if let Some(git) = &self.git {
            git.trace_loaded();
        }
        debug!(?self, "TransportConfig loaded (full debug)");
    }
}

/// How the local checkout is brought up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStrategy {
    /// Remove the local directory and take a fresh shallow clone.
    #[default]
    Clone,
    /// Fast-forward the existing checkout, cloning when there is none yet.
    Pull,
    /// Leave the local directory alone.
    None,
}

/// Describes a git repository to mirror locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitSource {
    pub repo_url: String,
    #[serde(default)]
    pub auth: Option<GitAuth>,
    #[serde(default)]
    pub strategy: SyncStrategy,
    /// Checkout location. A temporary directory is used when absent.
    #[serde(default)]
    pub local_path: Option<PathBuf>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
}

impl GitSource {
    pub fn new(repo_url: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            auth: None,
            strategy: SyncStrategy::default(),
            local_path: None,
            author_name: None,
            author_email: None,
        }
    }

    pub fn with_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_local_path(mut self, local_path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(local_path.into());
        self
    }

    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Commit identity applied to the checkout, falling back to the crate defaults.
    pub fn author(&self) -> AuthorIdentity {
        AuthorIdentity {
            name: self
                .author_name
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR_NAME.to_string()),
            email: self
                .author_email
                .clone()
                .unwrap_or_else(|| DEFAULT_AUTHOR_EMAIL.to_string()),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            repo_url = %self.repo_url,
            strategy = ?self.strategy,
            local_path = ?self.local_path,
            authenticated = self.auth.is_some(),
            "Loaded git source"
        );
    }
}

/// Username/password pair handed to the transport on demand.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitAuth {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for GitAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitAuth")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// `user.name` / `user.email` written into the checkout on every sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}
