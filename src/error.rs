//! Error types for markdown-transport.
//!
//! Library code returns [`Error`]; the binary wraps it in `anyhow` at the CLI boundary.
//! Front-matter parsing is total, so there is no parse variant.

use std::path::PathBuf;

/// Top-level error type for sync and ingestion operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Required configuration is missing. Fatal, never retried.
    #[error("config error: {message}")]
    Config { message: String },

    /// Clone or pull against the remote failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Filesystem I/O error outside of directory traversal.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failures reported by a [`crate::contract::GitTransport`].
///
/// Authentication failures are kept apart from everything else so the
/// synchroniser can treat them as best effort during pull.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("authentication failed for {url}: {message}")]
    Authentication { url: String, message: String },

    #[error("git {operation} exited with {status}: {stderr}")]
    Command {
        operation: String,
        status: String,
        stderr: String,
    },

    #[error("failed to launch git: {0}")]
    Spawn(#[source] std::io::Error),
}

impl TransportError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, TransportError::Authentication { .. })
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config { .. })
    }
}
