/// `load_config` module: builds the run settings from an optional YAML file and reads the API secrets from the environment.
///
/// This module is the only place where user-supplied YAML is parsed and mapped to typed structs.
///
/// # Responsibilities
/// - Parse the optional YAML file into a [`Layout`] and [`Endpoints`]
/// - Resolve the root directory (`--root` flag, then the file, then the working directory)
/// - Read the four X credentials from the environment; they never come from the file
///
/// # Errors
/// All errors in this module use `anyhow::Error` and are surfaced at the CLI boundary.
///
/// Accepted YAML keys (all optional):
///
/// ```yaml
/// root: /srv/image-bot
/// images_dir: images
/// posted_dir: posted
/// state_file: posted.json
/// endpoints:
///   media_upload: https://upload.twitter.com/1.1/media/upload.json
///   create_post: https://api.twitter.com/2/tweets
/// ```
use anyhow::{Context, Result};
use image_poster_core::config::Layout;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::client::Endpoints;
use crate::oauth::Credentials;

pub const ENV_CONSUMER_KEY: &str = "X_CONSUMER_KEY";
pub const ENV_CONSUMER_SECRET: &str = "X_CONSUMER_SECRET";
pub const ENV_ACCESS_TOKEN: &str = "X_ACCESS_TOKEN";
pub const ENV_ACCESS_TOKEN_SECRET: &str = "X_ACCESS_TOKEN_SECRET";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    root: Option<PathBuf>,
    images_dir: Option<PathBuf>,
    posted_dir: Option<PathBuf>,
    state_file: Option<PathBuf>,
    #[serde(default)]
    endpoints: Endpoints,
}

/// Non-secret settings for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub layout: Layout,
    pub endpoints: Endpoints,
}

fn read_raw(path: &Path) -> Result<RawConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let config_content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    // An empty file parses as YAML null; treat it as "all defaults".
    if config_content.trim().is_empty() {
        return Ok(RawConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Loads the settings. `config` is optional; `root_override` wins over the
/// file's `root`, which in turn is resolved relative to the file's directory.
pub fn load_settings(config: Option<&Path>, root_override: Option<&Path>) -> Result<Settings> {
    let raw = match config {
        Some(path) => read_raw(path)?,
        None => RawConfig::default(),
    };

    let root = match (root_override, &raw.root, config) {
        (Some(root), _, _) => root.to_path_buf(),
        (None, Some(root), Some(config_path)) if root.is_relative() => config_path
            .parent()
            .map(|dir| dir.join(root))
            .unwrap_or_else(|| root.clone()),
        (None, Some(root), _) => root.clone(),
        (None, None, _) => {
            std::env::current_dir().context("Failed to determine the current directory")?
        }
    };

    let mut layout = Layout::at(root);
    if let Some(images_dir) = raw.images_dir {
        layout.images_dir = images_dir;
    }
    if let Some(posted_dir) = raw.posted_dir {
        layout.posted_dir = posted_dir;
    }
    if let Some(state_file) = raw.state_file {
        layout.state_file = state_file;
    }
    layout.trace_loaded();

    Ok(Settings {
        layout,
        endpoints: raw.endpoints,
    })
}

fn required_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) => {
            info!(var = name, "Credential found in env");
            Ok(value)
        }
        Err(e) => {
            error!(error = ?e, var = name, "Credential environment variable not set");
            Err(anyhow::anyhow!("{name} environment variable not set: {e}"))
        }
    }
}

/// Reads the four X credentials. All are required and have no defaults.
pub fn load_credentials() -> Result<Credentials> {
    Ok(Credentials {
        consumer_key: required_env(ENV_CONSUMER_KEY)?,
        consumer_secret: required_env(ENV_CONSUMER_SECRET)?,
        access_token: required_env(ENV_ACCESS_TOKEN)?,
        access_token_secret: required_env(ENV_ACCESS_TOKEN_SECRET)?,
    })
}
