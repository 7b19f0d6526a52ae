#![allow(dead_code)]

use std::path::PathBuf;

use gitqueue::job::{GitJob, Preset};

/// Builder for `GitJob` to simplify test setup.
pub struct JobBuilder {
    executable: String,
    working_dir: PathBuf,
    preset: Option<Preset>,
}

impl JobBuilder {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            executable: "git".to_string(),
            working_dir: working_dir.into(),
            preset: None,
        }
    }

    /// Shorthand for a shell job running `script` via `sh -c`, preset so a
    /// queue can launch it.
    pub fn sh(working_dir: impl Into<PathBuf>, script: &str) -> GitJob {
        JobBuilder::new(working_dir)
            .executable("sh")
            .preset(vec!["-c".to_string(), script.to_string()])
            .build()
    }

    pub fn executable(mut self, executable: &str) -> Self {
        self.executable = executable.to_string();
        self
    }

    pub fn preset(mut self, args: Vec<String>) -> Self {
        self.preset = Some(Preset::text(args));
        self
    }

    pub fn binary_preset(mut self, args: Vec<String>) -> Self {
        self.preset = Some(Preset::binary(args));
        self
    }

    pub fn build(self) -> GitJob {
        match self.preset {
            Some(preset) => {
                GitJob::with_executable_and_preset(self.executable, self.working_dir, preset)
            }
            None => GitJob::with_executable(self.executable, self.working_dir),
        }
    }
}

impl Default for JobBuilder {
    fn default() -> Self {
        Self::new(".")
    }
}
