// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Typed harness failures with miette diagnostics.
//!
//! Fixture-level failures (mismatches, stderr output) are not errors: they
//! are [`Verdict`](crate::verify::Verdict)s. Everything in here aborts the
//! whole run.

// Suppress unused_assignments for struct fields used by derive macros
#![allow(unused_assignments)]

use camino::Utf8PathBuf;
use miette::Diagnostic;

/// A failure that terminates a harness run.
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum HarnessError {
    /// The fixture root directory does not exist.
    #[error("fixture root '{root}' not found")]
    #[diagnostic(
        code(needle_harness::fixture_root_not_found),
        help("run from the project root or pass --root <DIR>")
    )]
    FixtureRootNotFound {
        /// The configured fixture root.
        root: Utf8PathBuf,
    },

    /// The build command could not be started.
    #[error("failed to start build command `{command}`")]
    #[diagnostic(
        code(needle_harness::build_spawn),
        help("make sure `{program}` is installed and on PATH")
    )]
    BuildSpawn {
        /// The full command line, for display.
        command: String,
        /// The program that failed to start.
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The build command ran but did not succeed.
    #[error("build command `{command}` failed with {status}")]
    #[diagnostic(code(needle_harness::build_failed))]
    BuildFailed {
        /// The full command line, for display.
        command: String,
        /// Exit status description.
        status: String,
    },

    /// The build command exited successfully but left no artifact behind.
    #[error("build command `{command}` did not produce '{artifact}'")]
    #[diagnostic(
        code(needle_harness::missing_artifact),
        help("the build command must write its output to the `{{out}}` path")
    )]
    MissingArtifact {
        /// The full command line, for display.
        command: String,
        /// Where the artifact was expected.
        artifact: Utf8PathBuf,
    },

    /// The subject binary could not be started for a fixture.
    #[error("failed to run subject '{binary}' on '{fixture}'")]
    #[diagnostic(code(needle_harness::subject_spawn))]
    SubjectSpawn {
        /// The subject binary.
        binary: Utf8PathBuf,
        /// The fixture being run.
        fixture: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
