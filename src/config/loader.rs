//! Configuration loading from file system
//!
//! Handles loading and parsing the config.json file.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument, warn};

use super::types::Config;

/// Errors from reading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Default config location: ~/.shortcut-kit/config.json
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".shortcut-kit")
        .join("config.json")
}

/// Read and parse a config file, reporting every failure.
pub fn try_load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration from `path`.
///
/// Returns Config::default() if the file is missing or invalid.
#[instrument(name = "load_config", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Config {
    if !path.exists() {
        info!("Config file not found, using defaults");
        return Config::default();
    }

    match try_load_config(path) {
        Ok(config) => {
            info!("Successfully loaded config");
            config
        }
        Err(e) => {
            let hint = if e.to_string().contains("timeoutMs") {
                "\n\nHint: sequence.timeoutMs must be a number of milliseconds or null (wait forever)."
            } else if e.to_string().contains("unknown variant") {
                "\n\nHint: onTimeout is \"commitExact\" or \"cancel\"; enterWithoutMatch is \"ignore\" or \"cancel\"."
            } else {
                ""
            };
            warn!(error = %e, hint = %hint, "Failed to load config, using defaults");
            Config::default()
        }
    }
}
