// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collecting the reports of a single run into a [`TestIndex`].

use crate::{
    config::{CollectorConfig, MalformedReportPolicy},
    errors::{CollectError, MalformedReportError, ReportParseError},
    index::TestIndex,
    parse::{ReportEvent, ReportStreamParser},
    sanitize::Sanitizer,
    scanner::ReportScanner,
};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::BufRead;
use tracing::{debug, warn};

/// Reads reports from disk and aggregates them into a sanitized [`TestIndex`].
#[derive(Clone, Debug)]
pub struct Collector<'cfg> {
    config: &'cfg CollectorConfig,
}

impl<'cfg> Collector<'cfg> {
    /// Creates a new collector.
    pub fn new(config: &'cfg CollectorConfig) -> Self {
        Self { config }
    }

    /// Finds the reports in `dir` and collects them.
    ///
    /// A missing directory is not an error: it results in an empty index.
    pub fn collect_dir(&self, dir: &Utf8Path) -> Result<CollectOutcome, CollectError> {
        let files = ReportScanner::new(&self.config.reports).scan(dir);
        debug!("found {} report(s) in {dir}", files.len());
        self.collect_files(files)
    }

    /// Collects the given reports, in order.
    ///
    /// A report only contributes to the index if it was read in full. What happens to reports
    /// that can't be read is determined by the configured [`MalformedReportPolicy`].
    pub fn collect_files<I>(&self, files: I) -> Result<CollectOutcome, CollectError>
    where
        I: IntoIterator,
        I::Item: AsRef<Utf8Path>,
    {
        let mut index = TestIndex::new();
        let mut parsed_reports = 0;
        let mut skipped_reports = Vec::new();

        for path in files {
            let path = path.as_ref();
            match self.parse_file(path) {
                Ok(file_index) => {
                    debug!("parsed {path}: {} class(es)", file_index.len());
                    index.absorb(file_index);
                    parsed_reports += 1;
                }
                Err(error) => match self.config.reports.on_malformed {
                    MalformedReportPolicy::Abort => {
                        return Err(CollectError::new(parsed_reports, error));
                    }
                    MalformedReportPolicy::Skip => {
                        warn!("skipping report: {error}");
                        skipped_reports.push(SkippedReport {
                            path: path.to_owned(),
                            error,
                        });
                    }
                },
            }
        }

        let sanitizer = Sanitizer::new(self.config.classes.nesting_separator.as_str());
        Ok(CollectOutcome {
            index: sanitizer.sanitize(index),
            parsed_reports,
            skipped_reports,
        })
    }

    /// Parses the report at `path` into its own, unsanitized index.
    pub fn parse_file(&self, path: &Utf8Path) -> Result<TestIndex, ReportParseError> {
        let parser = ReportStreamParser::from_path(path)?;
        Ok(index_events(parser)?)
    }

    /// Parses a report from `reader` into its own, unsanitized index.
    ///
    /// `source` identifies the report in errors.
    pub fn parse_reader<R: BufRead>(
        &self,
        reader: R,
        source: impl Into<Utf8PathBuf>,
    ) -> Result<TestIndex, MalformedReportError> {
        index_events(ReportStreamParser::new(reader, source))
    }
}

fn index_events<R: BufRead>(
    parser: ReportStreamParser<R>,
) -> Result<TestIndex, MalformedReportError> {
    let mut index = TestIndex::new();
    for event in parser {
        if let ReportEvent::TestCase(result) = event? {
            index.record_result(result);
        }
    }
    Ok(index)
}

/// The result of a collection run.
#[derive(Debug)]
pub struct CollectOutcome {
    /// The sanitized index.
    pub index: TestIndex,

    /// The number of reports that were read in full.
    pub parsed_reports: usize,

    /// Reports that were skipped because they couldn't be read.
    ///
    /// Always empty unless the policy is [`MalformedReportPolicy::Skip`].
    pub skipped_reports: Vec<SkippedReport>,
}

/// A report that was skipped.
#[derive(Debug)]
pub struct SkippedReport {
    /// The path to the report.
    pub path: Utf8PathBuf,

    /// Why it was skipped.
    pub error: ReportParseError,
}
