//! Repository synchroniser: brings a local checkout in line with the configured remote.
//!
//! Which path is taken depends on the requested [`SyncStrategy`] and on what is
//! found on disk *at the start of every call*:
//!
//! | strategy | checkout present        | checkout absent |
//! |----------|-------------------------|-----------------|
//! | `clone`  | wipe + shallow clone    | shallow clone   |
//! | `pull`   | fast-forward pull       | shallow clone   |
//! | `none`   | nothing                 | nothing         |
//!
//! Presence is never cached, so a checkout deleted or corrupted between calls is
//! repaired by the next one. Authentication failures while pulling are logged and
//! the call carries on with whatever is on disk.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::config::{GitSource, SyncStrategy, TransportConfig};
use crate::contract::{FetchRequest, GitTransport};
use crate::error::{Error, Result};

const TEMP_PREFIX: &str = "markdown-transport-";

/// A synchronised local directory. When no `local_path` was configured the
/// directory is temporary and is removed when this value is dropped.
#[derive(Debug)]
pub struct Checkout {
    path: PathBuf,
    temp: Option<TempDir>,
}

impl Checkout {
    fn persistent(path: PathBuf) -> Self {
        Self { path, temp: None }
    }

    fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempdir()
            .map_err(|e| Error::io(std::env::temp_dir(), e))?;
        Ok(Self {
            path: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

/// Whether `dir` holds a git checkout. Checked afresh on every call.
pub fn is_cloned(dir: &Path) -> bool {
    dir.join(".git").exists()
}

/// Bring the configured repository up to date according to its strategy and
/// return the checkout. Fails with a config error when no repository URL is set.
pub async fn sync<T>(transport: &T, config: &TransportConfig) -> Result<Checkout>
where
    T: GitTransport + ?Sized,
{
    let source = require_source(config)?;
    let checkout = match &source.local_path {
        Some(path) => Checkout::persistent(resolve(path)?),
        None => Checkout::temporary()?,
    };
    let dir = checkout.path();
    info!(path = %dir.display(), temporary = checkout.is_temporary(), "Using local path for git operations");

    let cloned = is_cloned(dir);
    info!(cloned, strategy = ?source.strategy, "Observed local checkout state");

    let request = FetchRequest::for_source(source, dir);
    match source.strategy {
        SyncStrategy::None => {
            info!(path = %dir.display(), "Git strategy is 'none', skipping git operations");
        }
        SyncStrategy::Pull if cloned => pull_best_effort(transport, &request).await?,
        SyncStrategy::Pull => {
            info!(
                repo_url = %source.repo_url,
                path = %dir.display(),
                "Repository not found, cloning instead of pulling"
            );
            fresh_clone(transport, &request).await?;
        }
        SyncStrategy::Clone => fresh_clone(transport, &request).await?,
    }

    apply_identity(transport, source, dir).await?;
    Ok(checkout)
}

/// Pull an existing checkout, or clone it when it is missing. Unlike [`sync`]
/// this requires a configured `local_path` and ignores the strategy.
pub async fn pull_repository<T>(transport: &T, config: &TransportConfig) -> Result<PathBuf>
where
    T: GitTransport + ?Sized,
{
    let source = require_source(config)?;
    let local_path = source
        .local_path
        .as_ref()
        .ok_or_else(|| Error::config("Git local path is not specified for pull operation."))?;
    let dir = resolve(local_path)?;

    let request = FetchRequest::for_source(source, &dir);
    if is_cloned(&dir) {
        pull_best_effort(transport, &request).await?;
    } else {
        info!(
            repo_url = %source.repo_url,
            path = %dir.display(),
            "Repository not found, cloning instead of pulling"
        );
        fresh_clone(transport, &request).await?;
    }

    apply_identity(transport, source, &dir).await?;
    Ok(dir)
}

fn require_source(config: &TransportConfig) -> Result<&GitSource> {
    match &config.git {
        Some(source) if source.repo_url.trim().is_empty() => {
            Err(Error::config("Git repository URL is not specified."))
        }
        Some(source) if source.repo_url.trim_start().starts_with('-') => Err(Error::config(
            format!("Git repository URL must not start with '-': {}", source.repo_url),
        )),
        Some(source) => Ok(source),
        None => Err(Error::config("Git repository URL is not specified.")),
    }
}

fn resolve(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| Error::io(path, e))
}

async fn pull_best_effort<T>(transport: &T, request: &FetchRequest) -> Result<()>
where
    T: GitTransport + ?Sized,
{
    match transport.pull_fast_forward(request).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_authentication() => {
            error!(
                error = %e,
                repo_url = %request.url,
                path = %request.dir.display(),
                "Git authentication failed during pull, continuing with existing checkout"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, repo_url = %request.url, "Git pull failed");
            Err(e.into())
        }
    }
}

/// Replace whatever is at `request.dir` with a fresh shallow clone. The
/// directory is removed again if the clone does not complete.
async fn fresh_clone<T>(transport: &T, request: &FetchRequest) -> Result<()>
where
    T: GitTransport + ?Sized,
{
    let dir = &request.dir;
    if dir.exists() {
        fs::remove_dir_all(dir).map_err(|e| {
            error!(error = ?e, path = %dir.display(), "Failed to remove existing directory");
            Error::io(dir, e)
        })?;
        debug!(path = %dir.display(), "Removed existing directory");
    }
    fs::create_dir_all(dir).map_err(|e| {
        error!(error = ?e, path = %dir.display(), "Failed to create checkout directory");
        Error::io(dir, e)
    })?;

    let guard = RemoveOnDrop::new(dir);
    info!(repo_url = %request.url, path = %dir.display(), "Cloning repository");
    if let Err(e) = transport.clone_shallow(request).await {
        if e.is_authentication() {
            error!(error = %e, repo_url = %request.url, "Git authentication failed during clone");
        } else {
            error!(error = %e, repo_url = %request.url, "Git clone failed");
        }
        return Err(e.into());
    }
    guard.disarm();
    Ok(())
}

async fn apply_identity<T>(transport: &T, source: &GitSource, dir: &Path) -> Result<()>
where
    T: GitTransport + ?Sized,
{
    if !is_cloned(dir) {
        warn!(path = %dir.display(), "No git checkout present, skipping author identity");
        return Ok(());
    }
    transport
        .set_identity(dir, &source.author())
        .await
        .map_err(Error::from)
}

/// Removes a directory when dropped unless disarmed. Covers both a failed
/// clone and a clone future that is dropped before completion.
struct RemoveOnDrop<'a> {
    dir: &'a Path,
    armed: bool,
}

impl<'a> RemoveOnDrop<'a> {
    fn new(dir: &'a Path) -> Self {
        Self { dir, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_dir_all(self.dir) {
            Ok(()) => debug!(path = %self.dir.display(), "Removed incomplete checkout"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                error!(error = ?e, path = %self.dir.display(), "Failed to remove incomplete checkout")
            }
        }
    }
}
