// src/job/version.rs

//! Parsing of `git --version` output.

use std::fmt;

use regex::Regex;
use tracing::warn;

/// Version triple reported by the git executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    pub fn as_tuple(self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse the leading `git version X.Y.Z` pattern from the first line of
/// `git --version` output.
///
/// Vendor suffixes (e.g. `git version 2.12.2.windows.1`) are ignored.
/// Returns `None` when the line does not match.
pub fn parse_git_version(line: &str) -> Option<GitVersion> {
    let pattern = match Regex::new(r"^git version (\d+)\.(\d+)\.(\d+)") {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(error = %err, "invalid git version pattern");
            return None;
        }
    };

    let captures = pattern.captures(line)?;
    let part = |index: usize| -> Option<u32> { captures.get(index)?.as_str().parse().ok() };

    Some(GitVersion {
        major: part(1)?,
        minor: part(2)?,
        patch: part(3)?,
    })
}
