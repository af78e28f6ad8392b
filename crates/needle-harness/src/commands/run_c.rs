// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Compile and run the C sources in a directory.
//!
//! Every `.c` file directly inside the directory is handed to a single
//! compiler invocation producing the same temporary artifact the golden
//! suite uses. The program runs attached to the terminal and the artifact
//! is deleted afterwards.

use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use needle_harness::subject::{DEFAULT_ARTIFACT, OUTPUT_PLACEHOLDER, SubjectBuild};
use std::fs;
use tracing::{info, instrument, warn};

/// Settings for `run-c`.
#[derive(Debug, Clone)]
pub struct RunCConfig {
    /// Directory containing the `.c` files; also the build directory.
    pub dir: Utf8PathBuf,
    /// C compiler accepting `-o <out> <files>...`.
    pub compiler: String,
    /// Artifact file name, resolved against `dir`.
    pub artifact: Utf8PathBuf,
}

impl Default for RunCConfig {
    fn default() -> Self {
        Self {
            dir: Utf8PathBuf::from("."),
            compiler: "gcc".to_string(),
            artifact: Utf8PathBuf::from(DEFAULT_ARTIFACT),
        }
    }
}

/// The compiler command for `sources` (file names relative to the build directory).
fn compile_command(compiler: &str, sources: &[String]) -> SubjectBuild {
    let mut args = vec!["-o".to_string(), OUTPUT_PLACEHOLDER.to_string()];
    args.extend(sources.iter().cloned());
    SubjectBuild {
        program: compiler.to_string(),
        args,
    }
}

/// Compile all C sources in `config.dir` and run the result.
///
/// The program's exit status is logged but not treated as an error.
#[instrument(skip_all, fields(dir = %config.dir))]
pub fn run(config: &RunCConfig) -> Result<()> {
    let sources = find_c_files(&config.dir)?;
    if sources.is_empty() {
        miette::bail!("No .c files found in '{}'", config.dir);
    }
    info!("Compiling {} C file(s)", sources.len());

    let binary = compile_command(&config.compiler, &sources).build(&config.artifact, &config.dir)?;
    let status = binary.run_attached()?;
    if !status.success() {
        warn!("Program exited with {status}");
    }
    Ok(())
}

/// File names of the `.c` files directly inside `dir`, sorted.
fn find_c_files(dir: &Utf8Path) -> Result<Vec<String>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))?
    {
        let entry = entry.into_diagnostic()?;
        if !entry.file_type().into_diagnostic()?.is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|_| miette::miette!("Non-UTF-8 path in '{}'", dir))?;

        if path.extension() == Some("c") {
            if let Some(name) = path.file_name() {
                files.push(name.to_string());
            }
        }
    }

    files.sort();
    Ok(files)
}
