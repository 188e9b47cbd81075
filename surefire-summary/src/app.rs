// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{ExpectedError, Result, SurefireExitCode},
    output::{OutputContext, OutputOpts},
    resolver::SourceDirResolver,
    sink::{SummarySink, write_human, write_json},
};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use std::io::Write;
use surefire_index::{
    Collector, MetricPublisher,
    config::{CollectorConfig, DefaultConfigWarnings, MalformedReportPolicy},
    errors::DisplayErrorChain,
};
use tracing::{debug, info, warn};

/// Summarize JUnit/Surefire XML test reports as per-class metrics.
///
/// Reports named `TEST-*.xml` are read from REPORTS_DIR, or `TESTS-*.xml` if there are none.
/// Nested classes are counted towards the class that encloses them.
#[derive(Debug, Parser)]
#[command(
    version,
    styles = crate::output::clap_styles::style(),
    max_term_width = 100
)]
pub struct SurefireSummaryApp {
    /// Directory containing the test reports
    #[arg(value_name = "REPORTS_DIR")]
    reports_dir: Utf8PathBuf,

    /// Config file, layered on top of the default config
    #[arg(long, value_name = "PATH", env = "SUREFIRE_SUMMARY_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Directory to search for source files (may be repeated)
    ///
    /// Metrics for a class are attributed to the first file named after the class found under
    /// these directories. Classes whose source file isn't found are reported as unresolved.
    #[arg(long = "source-dir", value_name = "DIR")]
    source_dirs: Vec<Utf8PathBuf>,

    /// What to do with reports that can't be read: abort, skip [default: from config]
    #[arg(long, value_name = "POLICY")]
    on_malformed: Option<MalformedReportPolicy>,

    /// Output format
    #[arg(long, value_enum, default_value_t, value_name = "FORMAT")]
    message_format: MessageFormat,

    #[clap(flatten)]
    output: OutputOpts,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum MessageFormat {
    /// One line per class
    #[default]
    Human,
    /// One JSON object per line, per class
    Json,
}

impl SurefireSummaryApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, writing the summary to `writer`.
    pub fn exec(self, output: OutputContext, writer: &mut dyn Write) -> Result<i32> {
        let mut config =
            CollectorConfig::from_sources(self.config.as_deref(), &mut DefaultConfigWarnings)?;
        if let Some(on_malformed) = self.on_malformed {
            config.reports.on_malformed = on_malformed;
        }
        debug!("malformed reports: {}", config.reports.on_malformed);

        let outcome = Collector::new(&config).collect_dir(&self.reports_dir)?;
        if output.verbose {
            for skipped in &outcome.skipped_reports {
                warn!("{}", DisplayErrorChain::new(&skipped.error));
            }
        }

        let mut resolver = SourceDirResolver::new(self.source_dirs);
        let mut sink = SummarySink::default();
        let summary = MetricPublisher::new(&config.metrics, &config.classes.source_suffix)
            .publish(&outcome.index, &mut resolver, &mut sink)?;

        let classes = sink.into_classes();
        let out = match self.message_format {
            MessageFormat::Human => write_human(&classes, &output.stdout_styles()),
            MessageFormat::Json => {
                write_json(&classes).map_err(|err| ExpectedError::JsonSerializeError { err })?
            }
        };
        writer
            .write_all(out.as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|err| ExpectedError::WriteOutputError { err })?;

        info!(
            "read {} report(s) ({} skipped), published {} class(es) ({} without tests, {} unresolved)",
            outcome.parsed_reports,
            outcome.skipped_reports.len(),
            summary.published,
            summary.skipped_empty,
            summary.unresolved.len(),
        );

        Ok(SurefireExitCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::Color;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::fs;
    use test_case::test_case;

    static GOOD_REPORT: &str = indoc! {r#"
        <testsuite name="Calculator" tests="3">
          <testcase classname="Calculator" name="adds" time="0.010"/>
          <testcase classname="Calculator$Division" name="by_zero" time="0.020">
            <failure message="no error raised"/>
          </testcase>
          <testcase classname="Calculator" name="sqrt">
            <skipped/>
          </testcase>
        </testsuite>
    "#};

    fn quiet_output() -> OutputContext {
        OutputContext {
            verbose: false,
            color: Color::Never,
        }
    }

    fn run(args: &[&str]) -> (Result<i32>, String) {
        let app = SurefireSummaryApp::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let result = app.exec(quiet_output(), &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test_case(&["surefire-summary", "reports"] ; "positional only")]
    #[test_case(&["surefire-summary", "reports", "--on-malformed", "skip"] ; "on malformed")]
    #[test_case(&["surefire-summary", "--source-dir", "a", "--source-dir", "b", "reports"] ; "source dirs")]
    #[test_case(&["surefire-summary", "reports", "--message-format", "json", "--color", "never", "-v"] ; "output options")]
    fn parse_valid(args: &[&str]) {
        SurefireSummaryApp::try_parse_from(args).unwrap();
    }

    #[test_case(&["surefire-summary", "reports", "--on-malformed", "skip"], MalformedReportPolicy::Skip ; "skip")]
    #[test_case(&["surefire-summary", "reports", "--on-malformed=abort"], MalformedReportPolicy::Abort ; "abort")]
    fn parse_on_malformed(args: &[&str], expected: MalformedReportPolicy) {
        let app = SurefireSummaryApp::try_parse_from(args).unwrap();
        assert_eq!(app.on_malformed, Some(expected));
    }

    #[test]
    fn bad_policy_lists_known_values() {
        let err = SurefireSummaryApp::try_parse_from([
            "surefire-summary",
            "reports",
            "--on-malformed",
            "retry",
        ])
        .unwrap_err();
        let message = err.to_string();
        assert!(
            message.contains("(known values: abort, skip)"),
            "message: {message}"
        );
    }

    #[test_case(&["surefire-summary"] ; "missing reports dir")]
    #[test_case(&["surefire-summary", "reports", "--on-malformed", "retry"] ; "bad policy")]
    #[test_case(&["surefire-summary", "reports", "--message-format", "xml"] ; "bad format")]
    fn parse_invalid(args: &[&str]) {
        SurefireSummaryApp::try_parse_from(args).unwrap_err();
    }

    #[test]
    fn summarizes_reports() {
        let reports = Utf8TempDir::new().unwrap();
        fs::write(reports.path().join("TEST-Calculator.xml"), GOOD_REPORT).unwrap();
        let sources = Utf8TempDir::new().unwrap();
        fs::write(sources.path().join("Calculator.pas"), "unit Calculator;").unwrap();

        let (result, out) = run(&[
            "surefire-summary",
            reports.path().as_str(),
            "--source-dir",
            sources.path().as_str(),
        ]);
        assert_eq!(result.unwrap(), SurefireExitCode::OK);
        assert_eq!(
            out,
            format!(
                "{}: 2 tests, 1 skipped, 0 errors, 1 failures, 30ms, 50% passed\n",
                sources.path().join("Calculator.pas")
            )
        );
    }

    #[test]
    fn json_output_unresolved() {
        let reports = Utf8TempDir::new().unwrap();
        fs::write(reports.path().join("TEST-Calculator.xml"), GOOD_REPORT).unwrap();

        let (result, out) = run(&[
            "surefire-summary",
            reports.path().as_str(),
            "--message-format",
            "json",
        ]);
        assert_eq!(result.unwrap(), SurefireExitCode::OK);

        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["artifact"], "Calculator");
        assert_eq!(value["resolved"], false);
        assert_eq!(value["metrics"]["test_success_density"], 50.0);
    }

    #[test]
    fn malformed_report_policy() {
        let reports = Utf8TempDir::new().unwrap();
        fs::write(reports.path().join("TEST-Broken.xml"), "<testsuite>").unwrap();
        fs::write(reports.path().join("TEST-Calculator.xml"), GOOD_REPORT).unwrap();

        let (result, out) = run(&["surefire-summary", reports.path().as_str()]);
        let err = result.unwrap_err();
        assert_eq!(err.process_exit_code(), SurefireExitCode::MALFORMED_REPORT);
        assert_eq!(out, "");

        let (result, out) = run(&[
            "surefire-summary",
            reports.path().as_str(),
            "--on-malformed",
            "skip",
        ]);
        assert_eq!(result.unwrap(), SurefireExitCode::OK);
        assert!(out.starts_with("Calculator (unresolved): "), "output: {out}");
    }

    #[test]
    fn invalid_config() {
        let reports = Utf8TempDir::new().unwrap();
        let config = reports.path().join("surefire.toml");
        fs::write(&config, "[metrics]\ndensity-precision = 10\n").unwrap();

        let (result, _) = run(&[
            "surefire-summary",
            reports.path().as_str(),
            "--config",
            config.as_str(),
        ]);
        assert_eq!(
            result.unwrap_err().process_exit_code(),
            SurefireExitCode::SETUP_ERROR
        );
    }
}
