// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::errors::{GitqueueError, Result};

/// Load a configuration file from a given path.
///
/// This only performs TOML deserialization; use [`load_and_validate`] to
/// also run the sanity checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate(&config)?;
    Ok(config)
}

/// Resolve the configuration for a possibly-absent `--config` flag.
///
/// - An explicit path must exist and parse.
/// - Without one, `Gitqueue.toml` in the current working directory is used
///   when present; otherwise built-in defaults apply.
pub fn load_optional(path: Option<&Path>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path),
        None => {
            let default = default_config_path();
            if default.exists() {
                load_and_validate(&default)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Helper to resolve the default config path.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Gitqueue.toml")
}

fn validate(config: &ConfigFile) -> Result<()> {
    if config.git.executable.trim().is_empty() {
        return Err(GitqueueError::ConfigError(
            "git.executable must not be empty".to_string(),
        ));
    }
    Ok(())
}
