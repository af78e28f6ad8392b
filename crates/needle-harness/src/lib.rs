// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Golden-output test harness for the Needle interpreter.
//!
//! Fixtures are Needle sources whose expected output is written inline as
//! `// expect:` comments. The harness builds the interpreter, runs it on
//! every fixture and compares what it prints with what the fixture expects.
//!
//! The pieces, leaves first:
//! - [`fixture`] finds fixture files,
//! - [`expectation`] pulls expected lines out of a fixture,
//! - [`subject`] builds and runs the interpreter binary,
//! - [`verify`] compares output and produces a [`verify::Verdict`],
//! - [`harness`] drives a whole run.

pub mod error;
pub mod expectation;
pub mod fixture;
pub mod harness;
pub mod subject;
pub mod verify;

pub use error::HarnessError;
pub use harness::{Harness, HarnessConfig, RunSummary};
pub use verify::{Aggregate, Mismatch, Verdict};
