// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! The golden-output test driver.
//!
//! Builds the subject, runs it over every fixture, prints one status line
//! per fixture and a final verdict:
//!
//! ```text
//! tests/math/add.ndl -> ok
//! tests/math/div.ndl -> error: want 2 lines, got 1
//! tests/strings.ndl -> error: stderr: undefined variable 'x'
//! ======== result ========
//! ERROR!
//! ```
//!
//! Fixtures run one at a time. The subject binary is deleted when the run
//! ends, including when an error aborts it.

use crate::expectation::{DEFAULT_MARKER, read_expectations};
use crate::fixture::FixtureWalker;
use crate::subject::{DEFAULT_ARTIFACT, RunResult, SubjectBinary, SubjectBuild};
use crate::verify::{Aggregate, Verdict, verify};
use camino::{Utf8Path, Utf8PathBuf};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use tracing::{debug, info, instrument};

/// Separator printed before the final verdict.
pub const RESULT_SEPARATOR: &str = "======== result ========";

/// Default fixture root, relative to the current directory.
pub const DEFAULT_FIXTURE_ROOT: &str = "tests";

/// Default fixture file extension.
pub const DEFAULT_EXTENSION: &str = "ndl";

/// Settings for a harness run.
///
/// The defaults match the Needle repository layout: fixtures under `tests/`,
/// `.ndl` sources, `// expect:` markers, and `go build` in the current
/// directory.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Directory searched recursively for fixtures. Relative paths are
    /// resolved against the current directory, not `work_dir`.
    pub fixture_root: Utf8PathBuf,
    /// Fixture extension without the dot.
    pub extension: String,
    /// Literal token introducing an expected output line.
    pub marker: String,
    /// File name of the built subject, resolved against `work_dir`.
    pub artifact: Utf8PathBuf,
    /// Directory the build runs in.
    pub work_dir: Utf8PathBuf,
    /// Command producing the subject binary.
    pub build: SubjectBuild,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fixture_root: Utf8PathBuf::from(DEFAULT_FIXTURE_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            marker: DEFAULT_MARKER.to_string(),
            artifact: Utf8PathBuf::from(DEFAULT_ARTIFACT),
            work_dir: Utf8PathBuf::from("."),
            build: SubjectBuild::default(),
        }
    }
}

/// Counts for a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    /// Cleared by the first failing fixture and never set again.
    pub all_ok: bool,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            passed: 0,
            failed: 0,
            all_ok: true,
        }
    }
}

impl RunSummary {
    fn record(&mut self, verdict: &Verdict) {
        if verdict.is_ok() {
            self.passed += 1;
        } else {
            self.failed += 1;
            self.all_ok = false;
        }
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    pub fn aggregate(&self) -> Aggregate {
        Aggregate::from_flag(self.all_ok)
    }
}

/// Classify one fixture run.
///
/// Anything on standard error is a runtime error, whatever the standard
/// output says; otherwise the output is verified against `expected`.
pub fn classify(run: &RunResult, expected: &[String]) -> Verdict {
    if run.stderr.is_empty() {
        verify(&run.stdout, expected)
    } else {
        Verdict::runtime_error(&run.stderr)
    }
}

/// Golden-output test driver.
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self { config }
    }

    /// Build the subject, run every fixture and write the report to `out`.
    ///
    /// A completed run returns its summary whether or not fixtures failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the build fails, fixtures cannot be located or
    /// read, the subject cannot be started, or writing to `out` fails. The
    /// subject binary is removed in every case.
    #[instrument(skip_all, fields(root = %self.config.fixture_root))]
    pub fn run<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        info!("Starting golden test run");

        let subject = self
            .config
            .build
            .build(&self.config.artifact, &self.config.work_dir)?;
        let summary = self.run_fixtures(&subject, out)?;
        drop(subject);

        writeln!(out, "{RESULT_SEPARATOR}").into_diagnostic()?;
        writeln!(out, "{}", summary.aggregate()).into_diagnostic()?;
        out.flush().into_diagnostic()?;

        info!(
            passed = summary.passed,
            failed = summary.failed,
            "Golden test run finished"
        );
        Ok(summary)
    }

    fn run_fixtures<W: Write>(&self, subject: &SubjectBinary, out: &mut W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let fixtures = FixtureWalker::new(
            self.config.fixture_root.clone(),
            self.config.extension.clone(),
        );
        for fixture in fixtures {
            let fixture = fixture?;
            let verdict = self.check_fixture(subject, &fixture)?;
            summary.record(&verdict);

            writeln!(out, "{fixture} -> {verdict}").into_diagnostic()?;
            out.flush().into_diagnostic()?;
        }

        Ok(summary)
    }

    fn check_fixture(&self, subject: &SubjectBinary, fixture: &Utf8Path) -> Result<Verdict> {
        let expected = read_expectations(fixture, &self.config.marker)?;
        let run = subject.run(fixture)?;
        let verdict = classify(&run, &expected);
        debug!(
            %fixture,
            expected_lines = expected.len(),
            status = %run.status,
            ok = verdict.is_ok(),
            "Checked fixture"
        );
        Ok(verdict)
    }
}
