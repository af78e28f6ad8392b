// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Fixture discovery.
//!
//! Walks a directory tree lazily and yields every file with the fixture
//! extension. Entries come back in directory enumeration order; nothing is
//! sorted.

use crate::error::HarnessError;
use camino::{Utf8Path, Utf8PathBuf};
use miette::{Context, IntoDiagnostic, Result};
use std::fs;

/// Lazy recursive iterator over fixture files under a root directory.
///
/// Symlinked directories are not descended, to avoid infinite recursion from
/// circular links. A symlinked file is yielded when its target is a regular file.
#[derive(Debug)]
pub struct FixtureWalker {
    root: Utf8PathBuf,
    extension: String,
    started: bool,
    stack: Vec<(Utf8PathBuf, fs::ReadDir)>,
}

impl FixtureWalker {
    /// Create a walker over `root` matching files whose extension is `extension`
    /// (without the leading dot).
    ///
    /// No filesystem access happens until the first call to `next()`.
    pub fn new(root: impl Into<Utf8PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
            started: false,
            stack: Vec::new(),
        }
    }

    fn open_root(&mut self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(HarnessError::FixtureRootNotFound {
                root: self.root.clone(),
            }
            .into());
        }
        let entries = read_dir(&self.root)?;
        self.stack.push((self.root.clone(), entries));
        Ok(())
    }

    fn matches(&self, path: &Utf8Path) -> bool {
        path.extension() == Some(self.extension.as_str())
    }
}

impl Iterator for FixtureWalker {
    type Item = Result<Utf8PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            if let Err(e) = self.open_root() {
                return Some(Err(e));
            }
        }

        loop {
            let (dir, entries) = self.stack.last_mut()?;
            let Some(entry) = entries.next() else {
                self.stack.pop();
                continue;
            };

            let dir = dir.clone();
            let entry = match entry
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read directory '{dir}'"))
            {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let file_type = match entry.file_type().into_diagnostic() {
                Ok(file_type) => file_type,
                Err(e) => return Some(Err(e)),
            };
            let path = match Utf8PathBuf::from_path_buf(entry.path()) {
                Ok(path) => path,
                Err(path) => {
                    return Some(Err(miette::miette!(
                        "Non-UTF-8 path in '{}': {}",
                        dir,
                        path.display()
                    )));
                }
            };

            if file_type.is_symlink() {
                let target_is_file = fs::metadata(&path).is_ok_and(|meta| meta.is_file());
                if target_is_file && self.matches(&path) {
                    return Some(Ok(path));
                }
            } else if file_type.is_dir() {
                match read_dir(&path) {
                    Ok(children) => self.stack.push((path, children)),
                    Err(e) => return Some(Err(e)),
                }
            } else if file_type.is_file() && self.matches(&path) {
                return Some(Ok(path));
            }
        }
    }
}

fn read_dir(dir: &Utf8Path) -> Result<fs::ReadDir> {
    fs::read_dir(dir)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read directory '{dir}'"))
}
