// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitqueueError {
    /// `run`/`run_blocking` was called with no arguments and the job has no
    /// preset arguments to fall back to.
    #[error("no arguments given and the job has no preset arguments")]
    MissingArgs,

    /// The job's process is still running; it must finish (or be killed)
    /// before it can be launched again.
    #[error("job is already running")]
    AlreadyRunning,

    /// The OS could not start the process at all.
    #[error("failed to launch '{executable}': {source}")]
    Launch {
        executable: String,
        #[source]
        source: std::io::Error,
    },

    /// Completion was signalled but no captured output was recorded.
    #[error("process output not available")]
    OutputUnavailable,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, GitqueueError>;
