// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Needle test harness command-line interface.
//!
//! This is the main entry point for the `needle-harness` command. Run with
//! no arguments from the Needle repository root to build the interpreter
//! and check every fixture under `tests/`.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::Result;
use needle_harness::HarnessConfig;
use needle_harness::subject::SubjectBuild;

mod commands;

/// Golden-output test harness for the Needle interpreter
#[derive(Debug, Parser)]
#[command(name = "needle-harness")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Defaults to `test` with default settings
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the interpreter and check every fixture's output
    Test(TestArgs),

    /// Compile all C files in a directory and run the result
    RunC {
        /// Directory containing the .c files
        #[arg(long, default_value = ".")]
        dir: Utf8PathBuf,

        /// C compiler to invoke
        #[arg(long, default_value = "gcc")]
        compiler: String,

        /// Temporary executable name
        #[arg(long, default_value = needle_harness::subject::DEFAULT_ARTIFACT)]
        artifact: Utf8PathBuf,
    },
}

#[derive(Debug, Args)]
struct TestArgs {
    /// Directory searched recursively for fixtures
    #[arg(long, default_value = needle_harness::harness::DEFAULT_FIXTURE_ROOT)]
    root: Utf8PathBuf,

    /// Fixture file extension
    #[arg(long, default_value = needle_harness::harness::DEFAULT_EXTENSION)]
    ext: String,

    /// Token introducing an expected output line
    #[arg(long, default_value = needle_harness::expectation::DEFAULT_MARKER)]
    marker: String,

    /// Temporary executable name, relative to the working directory
    #[arg(long, default_value = needle_harness::subject::DEFAULT_ARTIFACT)]
    artifact: Utf8PathBuf,

    /// Directory the build command runs in
    #[arg(long, default_value = ".")]
    work_dir: Utf8PathBuf,

    /// Build command; `{out}` is replaced with the artifact path
    /// (default: `go build -o {out} .`)
    #[arg(last = true, value_name = "BUILD_COMMAND")]
    build: Vec<String>,
}

impl From<TestArgs> for HarnessConfig {
    fn from(args: TestArgs) -> Self {
        Self {
            fixture_root: args.root,
            extension: args.ext,
            marker: args.marker,
            artifact: args.artifact,
            work_dir: args.work_dir,
            build: SubjectBuild::from_command_line(&args.build).unwrap_or_default(),
        }
    }
}

/// Initialize logging to stderr, filtered by `RUST_LOG`.
fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("needle_harness=warn")),
        )
        .init();
}

fn main() -> Result<()> {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        None => commands::test::run(HarnessConfig::default()),
        Some(Command::Test(args)) => commands::test::run(args.into()),
        Some(Command::RunC {
            dir,
            compiler,
            artifact,
        }) => commands::run_c::run(&commands::run_c::RunCConfig {
            dir,
            compiler,
            artifact,
        }),
    };

    // Failing fixtures still exit 0; only aborted runs exit 1.
    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{e:?}");
            std::process::exit(1);
        }
    }
}
