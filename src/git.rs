//! [`GitTransport`] backed by the `git` executable.

use async_trait::async_trait;
use regex::Regex;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::OnceLock;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::config::{AuthorIdentity, GitAuth};
use crate::contract::{FetchRequest, GitTransport};
use crate::error::TransportError;

/// Runs `git` as a child process. Prompts are disabled, so missing or wrong
/// credentials fail fast instead of hanging on a terminal.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCli {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    async fn run<I, S>(&self, operation: &str, url: &str, args: I) -> Result<(), TransportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let output = Command::new(&self.program)
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                error!(error = ?e, program = %self.program, "Failed to launch git process");
                TransportError::Spawn(e)
            })?;

        if output.status.success() {
            debug!(operation, status = ?output.status, "git finished");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if auth_failure_pattern().is_match(&stderr) {
            return Err(TransportError::Authentication {
                url: url.to_string(),
                message: stderr,
            });
        }
        Err(TransportError::Command {
            operation: operation.to_string(),
            status: output.status.to_string(),
            stderr,
        })
    }
}

fn auth_failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)authentication failed|could not read (username|password)|invalid username or password|permission denied \(publickey|returned error: 40[13]",
        )
        .expect("auth failure pattern is valid")
    })
}

/// Embed credentials into an http(s) URL. Other schemes (ssh, file, scp-style)
/// authenticate out of band and are returned untouched.
pub fn authenticated_url(url: &str, auth: Option<&GitAuth>) -> String {
    let Some(auth) = auth else {
        return url.to_string();
    };
    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return url.to_string();
    }
    if let Some(username) = auth.username.as_deref() {
        if parsed.set_username(username).is_err() {
            return url.to_string();
        }
    }
    if let Some(password) = auth.password.as_deref() {
        if parsed.set_password(Some(password)).is_err() {
            return url.to_string();
        }
    }
    parsed.to_string()
}

#[async_trait]
impl GitTransport for GitCli {
    async fn clone_shallow(&self, request: &FetchRequest) -> Result<(), TransportError> {
        let auth = (request.credentials)();
        let remote = authenticated_url(&request.url, auth.as_ref());
        debug!(repo_url = %request.url, path = %request.dir.display(), "Running git clone");

        let dir = request.dir.as_os_str();
        let clone_args: [&OsStr; 7] = [
            "clone".as_ref(),
            "--depth=1".as_ref(),
            "--single-branch".as_ref(),
            "--quiet".as_ref(),
            "--".as_ref(),
            remote.as_ref(),
            dir,
        ];
        self.run("clone", &request.url, clone_args).await?;

        if remote != request.url {
            // Keep credentials out of .git/config.
            let scrub_args: [&OsStr; 6] = [
                "-C".as_ref(),
                dir,
                "remote".as_ref(),
                "set-url".as_ref(),
                "origin".as_ref(),
                request.url.as_ref(),
            ];
            self.run("remote set-url", &request.url, scrub_args).await?;
        }

        info!(repo_url = %request.url, path = %request.dir.display(), "Successfully cloned git repository");
        Ok(())
    }

    async fn pull_fast_forward(&self, request: &FetchRequest) -> Result<(), TransportError> {
        let auth = (request.credentials)();
        let remote = authenticated_url(&request.url, auth.as_ref());
        debug!(repo_url = %request.url, path = %request.dir.display(), "Running git pull");

        let pull_args: [&OsStr; 7] = [
            "-C".as_ref(),
            request.dir.as_os_str(),
            "pull".as_ref(),
            "--ff-only".as_ref(),
            "--quiet".as_ref(),
            "--".as_ref(),
            remote.as_ref(),
        ];
        self.run("pull", &request.url, pull_args).await?;

        info!(repo_url = %request.url, path = %request.dir.display(), "Pulled git repository");
        Ok(())
    }

    async fn set_identity(
        &self,
        dir: &Path,
        author: &AuthorIdentity,
    ) -> Result<(), TransportError> {
        let location = dir.display().to_string();
        for (key, value) in [("user.name", &author.name), ("user.email", &author.email)] {
            let args: [&OsStr; 5] = [
                "-C".as_ref(),
                dir.as_os_str(),
                "config".as_ref(),
                key.as_ref(),
                value.as_ref(),
            ];
            self.run("config", &location, args).await?;
        }
        debug!(path = %location, name = %author.name, email = %author.email, "Applied author identity");
        Ok(())
    }
}
