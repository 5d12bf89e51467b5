//! Ingestion orchestrator: turns a content directory (local, or synchronised from
//! git first) into a list of [`ContentRecord`]s.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::TransportConfig;
use crate::contract::GitTransport;
use crate::error::{Error, Result};
use crate::git::GitCli;
use crate::parser::{self, ContentRecord};
use crate::synchronise;

/// Loads Markdown content according to a [`TransportConfig`].
///
/// Every call re-reads the filesystem; nothing is cached between calls.
pub struct MarkdownTransport<T = GitCli> {
    config: TransportConfig,
    transport: T,
}

impl MarkdownTransport<GitCli> {
    pub fn new(config: TransportConfig) -> Self {
        Self::with_transport(config, GitCli::new())
    }
}

impl<T: GitTransport> MarkdownTransport<T> {
    pub fn with_transport(config: TransportConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Load every content file under the content root.
    ///
    /// With a git source the repository is synchronised first and its checkout
    /// becomes the root. Unreadable entries are logged and skipped. Records come
    /// back in directory-listing order, which is platform dependent; sort with
    /// [`crate::filters::sort_by_date`] when order matters.
    pub async fn load_all(&self) -> Result<Vec<ContentRecord>> {
        if self.config.git.is_some() {
            let checkout = synchronise::sync(&self.transport, &self.config).await?;
            return Ok(self.load_dir(checkout.path()));
        }

        let content_dir = self
            .config
            .content_dir
            .as_deref()
            .ok_or_else(|| Error::config("Content directory is not specified."))?;
        Ok(self.load_dir(content_dir))
    }

    /// Parse a single known file, skipping directory traversal.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<ContentRecord> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|e| Error::io(path, e))?;
        Ok(parser::parse(&raw, path))
    }

    /// Explicitly synchronise the repository into its configured `local_path`.
    pub async fn sync(&self) -> Result<PathBuf> {
        let has_local_path = self
            .config
            .git
            .as_ref()
            .is_some_and(|git| git.local_path.is_some());
        if !has_local_path {
            return Err(Error::config(
                "Git repository URL and local path must be specified in config to sync.",
            ));
        }
        let checkout = synchronise::sync(&self.transport, &self.config).await?;
        Ok(checkout.path().to_path_buf())
    }

    fn load_dir(&self, root: &Path) -> Vec<ContentRecord> {
        let files = find_content_files(root, &self.config.extensions);
        info!(root = %root.display(), files = files.len(), "Found content files");

        let records: Vec<ContentRecord> = files
            .into_iter()
            .filter_map(|path| match fs::read(&path) {
                Ok(raw) => Some(parser::parse(&raw, &path)),
                Err(e) => {
                    error!(error = ?e, path = %path.display(), "Failed to read content file, skipping");
                    None
                }
            })
            .collect();
        info!(records = records.len(), "Loaded content records");
        records
    }
}

/// Recursively collect files under `root` whose extension is in `extensions`,
/// depth-first in directory-listing order. A missing root yields nothing.
/// Symlinked directories are followed, but each directory is walked once.
pub fn find_content_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if !root.exists() {
        warn!(path = %root.display(), "Directory not found, skipping recursive file search");
        return files;
    }
    visit_dir(root, extensions, &mut HashSet::new(), &mut files);
    files
}

fn visit_dir(
    dir: &Path,
    extensions: &[String],
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) {
    match fs::canonicalize(dir) {
        Ok(real) if !visited.insert(real.clone()) => {
            warn!(path = %dir.display(), "Directory already visited, skipping symlink cycle");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = ?e, path = %dir.display(), "Error resolving directory");
            return;
        }
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(error = ?e, path = %dir.display(), "Error reading directory");
            return;
        }
    };

    for entry in entries {
        let path = match entry {
            Ok(entry) => entry.path(),
            Err(e) => {
                error!(error = ?e, path = %dir.display(), "Error reading directory entry");
                continue;
            }
        };
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) => {
                error!(error = ?e, path = %path.display(), "Error getting stats for file");
                continue;
            }
        };

        if metadata.is_dir() {
            if path.file_name().is_some_and(|name| name == ".git") {
                debug!(path = %path.display(), "Skipping git directory");
                continue;
            }
            visit_dir(&path, extensions, visited, files);
        } else if has_extension(&path, extensions) {
            files.push(path);
        }
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
}
