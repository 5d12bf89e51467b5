/// `load_config` module: reads a YAML config file into a [`TransportConfig`] and
/// injects git credentials from the environment.
///
/// Secrets never need to live in the file: when the `git` section carries no
/// `auth`, `GIT_USERNAME` / `GIT_PASSWORD` are used if set.
///
/// # Errors
/// Failures use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::config::{GitAuth, TransportConfig};

pub const USERNAME_ENV: &str = "GIT_USERNAME";
pub const PASSWORD_ENV: &str = "GIT_PASSWORD";

/// Loads a YAML config file and injects credentials from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TransportConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: TransportConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Some(git) = config.git.as_mut() {
        if git.auth.is_none() {
            git.auth = auth_from_env();
        }
    }

    config.trace_loaded();
    Ok(config)
}

fn auth_from_env() -> Option<GitAuth> {
    let username = std::env::var(USERNAME_ENV).ok().filter(|v| !v.is_empty())?;
    let password = std::env::var(PASSWORD_ENV).ok();
    info!(env = USERNAME_ENV, "Using git credentials from environment");
    Some(GitAuth {
        username: Some(username),
        password,
    })
}
