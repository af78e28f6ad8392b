// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Output verification and per-fixture verdicts.
//!
//! Compares the subject's captured standard output against the expected
//! lines and reports at most one difference: either the line counts
//! disagree, or the first line that differs.

use std::borrow::Cow;
use std::fmt;

/// Number of characters of standard error kept in a runtime error verdict.
pub const STDERR_PREVIEW_CHARS: usize = 256;

/// How a fixture's output differed from its expectations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The subject printed a different number of lines than expected.
    LineCount { expected: usize, actual: usize },
    /// Same number of lines; `index` is the first one that differs.
    Line {
        index: usize,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LineCount { expected, actual } => {
                write!(f, "want {expected} lines, got {actual}")
            }
            Self::Line {
                expected, actual, ..
            } => write!(f, "expected '{expected}', got '{actual}'"),
        }
    }
}

/// Outcome of running a single fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Output matched the expectations exactly.
    Ok,
    /// Output differed from the expectations.
    Mismatch(Mismatch),
    /// The subject wrote to standard error; holds a trimmed preview.
    RuntimeError(String),
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Build a runtime error verdict from raw standard error text.
    ///
    /// Line endings are normalised to `\n`, then the first
    /// [`STDERR_PREVIEW_CHARS`] characters are kept and trimmed.
    pub fn runtime_error(stderr: &str) -> Self {
        let preview: String = normalize_newlines(stderr)
            .chars()
            .take(STDERR_PREVIEW_CHARS)
            .collect();
        Self::RuntimeError(preview.trim().to_string())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Mismatch(mismatch) => write!(f, "error: {mismatch}"),
            Self::RuntimeError(preview) => write!(f, "error: stderr: {preview}"),
        }
    }
}

/// Aggregate outcome of a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    AllOk,
    SomeFailed,
}

impl Aggregate {
    pub fn from_flag(all_ok: bool) -> Self {
        if all_ok { Self::AllOk } else { Self::SomeFailed }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllOk => f.write_str("OK!"),
            Self::SomeFailed => f.write_str("ERROR!"),
        }
    }
}

/// Translate `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split captured output into lines with the terminators removed.
///
/// Recognises `\n`, `\r\n`, lone `\r` and the remaining Unicode line
/// boundaries. A trailing terminator does not produce an empty final line.
pub fn split_output_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                end = j + 1;
            }
        }
        start = end;
    }
    if start < text.len() {
        lines.push(&text[start..]);
    }
    lines
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Compare captured standard output with the expected lines.
pub fn verify(stdout: &str, expected: &[String]) -> Verdict {
    let actual = split_output_lines(stdout);

    if actual.len() != expected.len() {
        return Verdict::Mismatch(Mismatch::LineCount {
            expected: expected.len(),
            actual: actual.len(),
        });
    }

    match actual
        .iter()
        .zip(expected)
        .position(|(actual, expected)| *actual != expected.as_str())
    {
        None => Verdict::Ok,
        Some(index) => Verdict::Mismatch(Mismatch::Line {
            index,
            expected: expected[index].clone(),
            actual: actual[index].to_string(),
        }),
    }
}
