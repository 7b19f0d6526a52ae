// src/job/output.rs

//! Captured process output in its two capture modes.

/// Payload captured from one process channel (stdout or stderr).
///
/// A job's accessors return `Option<Output>`: `None` means the invocation
/// has not completed yet, which is distinct from a completed invocation
/// that produced nothing (`Text(vec![])` / `Binary(vec![])`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// UTF-8 decoded lines, split on `\n`. A final empty line produced by a
    /// trailing newline is dropped.
    Text(Vec<String>),
    /// Raw bytes, unmodified.
    Binary(Vec<u8>),
}

impl Output {
    /// Decode raw bytes according to the capture mode.
    pub fn capture(bytes: Vec<u8>, binary: bool) -> Self {
        if binary {
            Output::Binary(bytes)
        } else {
            Output::Text(split_lines(&bytes))
        }
    }

    /// Captured lines, or `None` for a binary capture.
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Output::Text(lines) => Some(lines),
            Output::Binary(_) => None,
        }
    }

    /// Captured raw bytes, or `None` for a text capture.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Output::Binary(bytes) => Some(bytes),
            Output::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Output::Text(lines) => lines.is_empty(),
            Output::Binary(bytes) => bytes.is_empty(),
        }
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    // `"a\nb\n"` splits into ["a", "b", ""]; the final element is an
    // artifact of the trailing newline, not a real line.
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}
