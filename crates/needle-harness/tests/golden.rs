// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for the golden-output harness.
//!
//! A tiny shell script stands in for the Needle interpreter: it echoes the
//! argument of every `print(...)` line of the fixture to stdout and of every
//! `fail(...)` line to stderr. The "build" copies that script to the
//! artifact path.
//!
//! All tests build into one shared work directory. The artifact has a fixed
//! name there, so the tests are serialized on it.

#![cfg(unix)]

use camino::{Utf8Path, Utf8PathBuf};
use needle_harness::subject::{DEFAULT_ARTIFACT, SubjectBuild};
use needle_harness::{Aggregate, Harness, HarnessConfig};
use serial_test::serial;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

const FAKE_SUBJECT: &str = r#"#!/bin/sh
sed -n 's/^print(\(.*\));.*$/\1/p' "$1"
sed -n 's/^fail(\(.*\));.*$/\1/p' "$1" >&2
"#;

/// Shared build directory for every test in this file.
fn work_dir() -> Utf8PathBuf {
    let dir = Utf8PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("needle-harness-golden");
    fs::create_dir_all(&dir).expect("failed to create work dir");
    dir
}

fn artifact_path() -> Utf8PathBuf {
    work_dir()
        .canonicalize_utf8()
        .expect("work dir must exist")
        .join(DEFAULT_ARTIFACT)
}

/// Writes the fake interpreter and returns a build that installs it.
fn fake_build(temp: &TempDir) -> SubjectBuild {
    let script = temp.path().join("fake_needle.sh");
    fs::write(&script, FAKE_SUBJECT).unwrap();
    SubjectBuild {
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            format!("cp '{}' {{out}} && chmod +x {{out}}", script.display()),
        ],
    }
}

fn fixture_root(temp: &TempDir) -> Utf8PathBuf {
    let root = Utf8PathBuf::from_path_buf(temp.path().join("tests")).unwrap();
    fs::create_dir_all(&root).unwrap();
    root
}

fn write_fixture(root: &Utf8Path, name: &str, content: &str) -> Utf8PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn config(temp: &TempDir) -> HarnessConfig {
    HarnessConfig {
        fixture_root: fixture_root(temp),
        work_dir: work_dir(),
        build: fake_build(temp),
        ..HarnessConfig::default()
    }
}

fn run(config: HarnessConfig) -> (miette::Result<needle_harness::RunSummary>, String) {
    let mut out = Vec::new();
    let result = Harness::new(config).run(&mut out);
    (result, String::from_utf8(out).unwrap())
}

#[test]
#[serial(subject_artifact)]
fn all_fixtures_pass() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    let add = write_fixture(&config.fixture_root, "add.ndl", "print(2); // expect: 2\n");
    let nested = write_fixture(
        &config.fixture_root,
        "classes/nested/two.ndl",
        "print(1); // expect: 1\nlet x = 2;\nprint(2); // expect: 2\n",
    );
    let silent = write_fixture(&config.fixture_root, "silent.ndl", "let y = 3;\n");

    assert!(!artifact_path().exists());
    let (result, out) = run(config);
    let summary = result.unwrap();

    assert_eq!(summary.aggregate(), Aggregate::AllOk);
    assert_eq!(summary.passed, 3);
    assert!(out.contains(&format!("{add} -> ok\n")), "{out}");
    assert!(out.contains(&format!("{nested} -> ok\n")), "{out}");
    assert!(out.contains(&format!("{silent} -> ok\n")), "{out}");
    assert!(out.ends_with("======== result ========\nOK!\n"), "{out}");
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn failures_are_reported_and_run_continues() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    let short = write_fixture(
        &config.fixture_root,
        "short.ndl",
        "print(1); // expect: 1\n// expect: 2\n",
    );
    let wrong = write_fixture(&config.fixture_root, "wrong.ndl", "print(y); // expect: x\n");
    let crash = write_fixture(
        &config.fixture_root,
        "crash.ndl",
        "print(1); // expect: 1\nfail(undefined variable 'z');\n",
    );
    let fine = write_fixture(&config.fixture_root, "fine.ndl", "print(ok); // expect: ok\n");

    let (result, out) = run(config);
    let summary = result.unwrap();

    assert_eq!(summary.aggregate(), Aggregate::SomeFailed);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.failed, 3);
    assert!(out.contains(&format!("{short} -> error: want 2 lines, got 1\n")), "{out}");
    assert!(out.contains(&format!("{wrong} -> error: expected 'x', got 'y'\n")), "{out}");
    assert!(
        out.contains(&format!("{crash} -> error: stderr: undefined variable 'z'\n")),
        "{out}"
    );
    assert!(out.contains(&format!("{fine} -> ok\n")), "{out}");
    assert!(out.ends_with("======== result ========\nERROR!\n"), "{out}");
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn one_line_per_fixture() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    for i in 0..5 {
        write_fixture(
            &config.fixture_root,
            &format!("case{i}.ndl"),
            &format!("print({i}); // expect: {i}\n"),
        );
    }
    write_fixture(&config.fixture_root, "README.md", "// expect: ignored\n");

    let (result, out) = run(config);
    assert_eq!(result.unwrap().total(), 5);
    assert_eq!(out.lines().filter(|l| l.contains(" -> ")).count(), 5);
    assert!(!out.contains("README"));
}

#[test]
#[serial(subject_artifact)]
fn long_stderr_is_truncated() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    let noise = "e".repeat(400);
    let path = write_fixture(&config.fixture_root, "noisy.ndl", &format!("fail({noise});\n"));

    let (result, out) = run(config);
    assert!(!result.unwrap().all_ok);
    let line = out
        .lines()
        .find(|l| l.starts_with(path.as_str()))
        .expect("missing fixture line");
    let preview = line
        .strip_prefix(&format!("{path} -> error: stderr: "))
        .expect("not a stderr verdict");
    assert_eq!(preview, "e".repeat(256));
}

#[test]
#[serial(subject_artifact)]
fn build_failure_runs_nothing() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp);
    write_fixture(&config.fixture_root, "add.ndl", "print(2); // expect: 2\n");
    config.build = SubjectBuild {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "echo half > {out}; exit 1".to_string()],
    };

    let (result, out) = run(config);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("failed with"), "{err}");
    assert!(out.is_empty(), "{out}");
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn missing_fixture_root_aborts_after_cleanup() {
    let temp = TempDir::new().unwrap();
    let mut config = config(&temp);
    config.fixture_root = config.fixture_root.join("does-not-exist");

    let (result, out) = run(config);
    let err = result.unwrap_err();
    assert!(err.to_string().contains("not found"), "{err}");
    assert!(!out.contains("result"), "{out}");
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn stale_artifact_is_replaced_and_removed() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    write_fixture(&config.fixture_root, "add.ndl", "print(2); // expect: 2\n");
    fs::write(artifact_path(), "left over from a crashed run").unwrap();

    let (result, _out) = run(config);
    assert!(result.unwrap().all_ok);
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn cli_reports_failures_with_success_exit() {
    let temp = TempDir::new().unwrap();
    let config = config(&temp);
    write_fixture(&config.fixture_root, "wrong.ndl", "print(y); // expect: x\n");
    let build = config.build.args[1].clone();

    let output = Command::new(env!("CARGO_BIN_EXE_needle-harness"))
        .args(["test", "--root"])
        .arg(config.fixture_root.as_str())
        .arg("--work-dir")
        .arg(work_dir().as_str())
        .args(["--", "sh", "-c"])
        .arg(build)
        .output()
        .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("-> error: expected 'x', got 'y'"), "{stdout}");
    assert!(stdout.ends_with("ERROR!\n"), "{stdout}");
    assert!(!artifact_path().exists());
}

#[test]
#[serial(subject_artifact)]
fn cli_build_failure_exits_nonzero() {
    let temp = TempDir::new().unwrap();
    let root = fixture_root(&temp);

    let output = Command::new(env!("CARGO_BIN_EXE_needle-harness"))
        .args(["test", "--root"])
        .arg(root.as_str())
        .arg("--work-dir")
        .arg(work_dir().as_str())
        .args(["--", "false"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(!artifact_path().exists());
}
