// src/config/model.rs

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [git]
/// executable = "/usr/local/bin/git"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Git invocation settings from `[git]`.
    #[serde(default)]
    pub git: GitSection,
}

/// `[git]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GitSection {
    /// Executable launched for every job. Defaults to `git` resolved via
    /// `PATH`; set an absolute path to pin a specific installation.
    #[serde(default = "default_executable")]
    pub executable: String,
}

fn default_executable() -> String {
    "git".to_string()
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            executable: default_executable(),
        }
    }
}
