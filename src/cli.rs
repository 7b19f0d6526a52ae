// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gitqueue`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gitqueue",
    version,
    about = "Run git commands serially through a job queue.",
    long_about = None
)]
pub struct CliArgs {
    /// Working directory the git commands run in.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub repo: String,

    /// Path to the config file (TOML).
    ///
    /// If omitted, `Gitqueue.toml` in the current working directory is used
    /// when present, otherwise built-in defaults apply.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Capture raw bytes instead of UTF-8 decoded lines.
    #[arg(long)]
    pub binary: bool,

    /// Query the git executable's version, print it and exit.
    #[arg(long)]
    pub probe_version: bool,

    /// Run the commands listed in FILE (one whitespace-split git command per
    /// line; blank lines and `#` comments are skipped) through the queue,
    /// strictly in file order.
    #[arg(long, value_name = "FILE")]
    pub batch: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GITQUEUE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Arguments passed to git, e.g. `gitqueue -- status --short`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
