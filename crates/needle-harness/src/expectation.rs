// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Expected-output extraction from `// expect:` comments.
//!
//! A fixture carries its own expected output. Every line containing the
//! marker contributes exactly one expected output line, in file order:
//!
//! ```text
//! print(1 + 1); // expect: 2
//! print("a");   // expect: a
//! ```

use crate::verify::normalize_newlines;
use camino::Utf8Path;
use miette::{Context, IntoDiagnostic, Result};
use std::fs;

/// The marker used by the Needle test suite.
pub const DEFAULT_MARKER: &str = "// expect:";

/// Collect the expected output lines from fixture text.
///
/// Everything after the first occurrence of `marker` on a line is trimmed
/// and kept. A marker with nothing after it yields an empty string, so the
/// result always has one entry per marker line. Lines may end in `\n`,
/// `\r\n` or a lone `\r`.
pub fn extract_expectations(text: &str, marker: &str) -> Vec<String> {
    normalize_newlines(text)
        .lines()
        .filter_map(|line| line.split_once(marker))
        .map(|(_, rest)| rest.trim().to_string())
        .collect()
}

/// Read a fixture from disk and extract its expectations.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid UTF-8.
pub fn read_expectations(path: &Utf8Path, marker: &str) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read fixture '{path}'"))?;
    Ok(extract_expectations(&text, marker))
}
