//! Scripted stand-in executables for tests.
//!
//! Real `git` is not required to exercise the job machinery: a [`FakeGit`]
//! is a small shell script written to a temp directory that prints whatever
//! the test needs and records how often it was invoked.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

pub struct FakeGit {
    dir: TempDir,
    executable: PathBuf,
    counter: PathBuf,
}

impl FakeGit {
    /// Script that prints `line` on stdout and exits 0; the usual stand-in
    /// for `git --version`.
    pub fn with_version_line(line: &str) -> Result<Self> {
        Self::new(&format!("echo '{line}'"))
    }

    /// Script with an arbitrary `sh` body. Every invocation appends one byte
    /// to the counter file before the body runs.
    pub fn new(body: &str) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let executable = dir.path().join("fake-git");
        let counter = dir.path().join("invocations");

        let script = format!(
            "#!/bin/sh\nprintf x >> '{}'\n{}\n",
            counter.display(),
            body
        );
        fs::write(&executable, script)?;

        let mut perms = fs::metadata(&executable)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&executable, perms)?;

        Ok(Self {
            dir,
            executable,
            counter,
        })
    }

    /// Path of the script, usable as a job's executable.
    pub fn executable(&self) -> String {
        self.executable.display().to_string()
    }

    /// Directory the script lives in; doubles as a scratch working dir.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// How many times the script has been invoked so far.
    pub fn invocations(&self) -> usize {
        fs::read(&self.counter).map(|bytes| bytes.len()).unwrap_or(0)
    }
}
