// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finding report files in a directory.

use crate::config::ReportsConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::io;
use tracing::{debug, warn};

/// Finds candidate report files in a directory.
///
/// Files whose names start with the primary prefix (`TEST-` by default) and end with the suffix
/// (`.xml`) are preferred. If there are none, files starting with the fallback prefix (`TESTS-`)
/// are used instead: that's where aggregated reports are written. Matching is case-sensitive and
/// not recursive.
#[derive(Clone, Debug)]
pub struct ReportScanner<'cfg> {
    config: &'cfg ReportsConfig,
}

impl<'cfg> ReportScanner<'cfg> {
    /// Creates a new scanner.
    pub fn new(config: &'cfg ReportsConfig) -> Self {
        Self { config }
    }

    /// Returns the report files in `dir`, sorted by file name.
    ///
    /// A missing directory, or a path that isn't a directory, yields no files.
    pub fn scan(&self, dir: &Utf8Path) -> Vec<Utf8PathBuf> {
        if !dir.is_dir() {
            warn!("reports directory not found: {dir}");
            return Vec::new();
        }

        let file_names = match list_file_names(dir) {
            Ok(file_names) => file_names,
            Err(error) => {
                warn!("failed to read reports directory {dir}: {error}");
                return Vec::new();
            }
        };

        let mut reports = self.matching(&file_names, &self.config.primary_prefix);
        if reports.is_empty() {
            debug!(
                "no {}*{} reports in {dir}, looking for {}*{}",
                self.config.primary_prefix,
                self.config.suffix,
                self.config.fallback_prefix,
                self.config.suffix,
            );
            reports = self.matching(&file_names, &self.config.fallback_prefix);
        }

        reports.sort_unstable();
        reports.into_iter().map(|name| dir.join(name)).collect()
    }

    fn matching<'a>(&self, file_names: &'a [String], prefix: &str) -> Vec<&'a str> {
        file_names
            .iter()
            .map(String::as_str)
            .filter(|name| name.starts_with(prefix) && name.ends_with(self.config.suffix.as_str()))
            .collect()
    }
}

fn list_file_names(dir: &Utf8Path) -> io::Result<Vec<String>> {
    let mut file_names = Vec::new();
    for entry in dir.read_dir_utf8()? {
        // Entries with non-UTF-8 names are reported as errors.
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                debug!("skipping entry in {dir}: {error}");
                continue;
            }
        };
        // Follows symlinks.
        if entry.path().is_file() {
            file_names.push(entry.file_name().to_owned());
        }
    }
    Ok(file_names)
}
