// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Building and running the subject binary.
//!
//! The subject is the externally built executable under test. It is built
//! once per run into a fixed file name and owned by a [`SubjectBinary`]
//! guard that deletes the file when dropped, so the artifact is gone after
//! a run however it ends.
//!
//! # Example
//!
//! ```no_run
//! use needle_harness::subject::SubjectBuild;
//! use camino::Utf8Path;
//!
//! let subject = SubjectBuild::default().build(Utf8Path::new("__test_build.exe"), Utf8Path::new("."))?;
//! let run = subject.run(Utf8Path::new("tests/hello.ndl"))?;
//! println!("{}", run.stdout);
//! # Ok::<(), miette::Report>(())
//! ```

use crate::error::HarnessError;
use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use std::fs;
use std::io::ErrorKind;
use std::process::{Command, ExitStatus, Stdio};
use tracing::{debug, info, instrument, warn};

/// Placeholder in build arguments replaced by the artifact path.
pub const OUTPUT_PLACEHOLDER: &str = "{out}";

/// Default artifact file name, created in the working directory.
pub const DEFAULT_ARTIFACT: &str = "__test_build.exe";

/// An external command that produces the subject binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectBuild {
    /// Program to run (looked up on PATH).
    pub program: String,
    /// Arguments; any occurrence of [`OUTPUT_PLACEHOLDER`] is replaced with
    /// the artifact path.
    pub args: Vec<String>,
}

impl Default for SubjectBuild {
    /// `go build -o {out} .`
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: ["build", "-o", OUTPUT_PLACEHOLDER, "."]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl SubjectBuild {
    /// Build from a command line split into words; `None` if empty.
    pub fn from_command_line(words: &[String]) -> Option<Self> {
        let (program, args) = words.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn resolved_args(&self, artifact: &Utf8Path) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, artifact.as_str()))
            .collect()
    }

    /// The command line as it will be executed, for messages.
    pub fn display(&self, artifact: &Utf8Path) -> String {
        std::iter::once(self.program.clone())
            .chain(self.resolved_args(artifact))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the build and take ownership of the produced artifact.
    ///
    /// The artifact name is resolved against `work_dir`, which is also the
    /// build's working directory. A stale artifact from an earlier run is
    /// removed first. The build's own output goes straight to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if `work_dir` does not exist, the build cannot be
    /// started, exits unsuccessfully, or does not create the artifact. No
    /// artifact is left behind in any of these cases.
    #[instrument(skip(self), fields(program = %self.program))]
    pub fn build(&self, artifact: &Utf8Path, work_dir: &Utf8Path) -> Result<SubjectBinary> {
        let work_dir = work_dir
            .canonicalize_utf8()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to resolve working directory '{work_dir}'"))?;
        let path = work_dir.join(artifact);

        if path.exists() {
            warn!("Removing stale subject binary '{path}'");
            fs::remove_file(&path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to remove stale subject binary '{path}'"))?;
        }

        // Owned from here on so a failed or partial build is cleaned up too.
        let binary = SubjectBinary { path };
        let command = self.display(&binary.path);
        info!("Building subject: {command}");

        let status = Command::new(&self.program)
            .args(self.resolved_args(&binary.path))
            .current_dir(&work_dir)
            .status()
            .map_err(|source| HarnessError::BuildSpawn {
                command: command.clone(),
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(HarnessError::BuildFailed {
                command,
                status: status.to_string(),
            }
            .into());
        }
        if !binary.path.is_file() {
            return Err(HarnessError::MissingArtifact {
                command,
                artifact: binary.path.clone(),
            }
            .into());
        }

        debug!("Built subject binary '{}'", binary.path);
        Ok(binary)
    }
}

/// Captured result of running the subject on one fixture.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub stdout: String,
    pub stderr: String,
    /// Recorded for logging; verdicts never depend on it.
    pub status: ExitStatus,
}

/// Scoped owner of the built subject binary.
///
/// The file is deleted when the guard is dropped.
#[derive(Debug)]
pub struct SubjectBinary {
    path: Utf8PathBuf,
}

impl SubjectBinary {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Run the subject with `fixture` as its only argument and capture its output.
    ///
    /// Stdin is closed and the environment is inherited unchanged. There is
    /// no timeout: a subject that never exits blocks the caller forever.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    #[instrument(skip(self))]
    pub fn run(&self, fixture: &Utf8Path) -> Result<RunResult> {
        let output = Command::new(self.path.as_std_path())
            .arg(fixture.as_std_path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| HarnessError::SubjectSpawn {
                binary: self.path.clone(),
                fixture: fixture.to_path_buf(),
                source,
            })?;

        debug!(status = %output.status, "Subject finished");
        Ok(RunResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            status: output.status,
        })
    }

    /// Run the subject with no arguments, attached to the terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be started.
    pub fn run_attached(&self) -> Result<ExitStatus> {
        Command::new(self.path.as_std_path())
            .status()
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to run '{}'", self.path))
    }
}

impl Drop for SubjectBinary {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed subject binary '{}'", self.path),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove subject binary '{}': {e}", self.path),
        }
    }
}
