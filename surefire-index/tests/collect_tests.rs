// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use color_eyre::eyre::{Result, bail};
use pretty_assertions::assert_eq;
use std::{collections::BTreeMap, time::Duration};
use surefire_index::{
    ArtifactResolver, Collector, Metric, MetricPublisher, MetricSink, OutcomeDelta, PublishSummary,
    ReportEvent, ReportStreamParser, TestStatus,
    config::{CollectorConfig, MalformedReportPolicy},
    errors::{ReportParseError, ResourceNotFoundError},
};

fn fixture_dir(name: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Resolves every identity to `<identity><suffix>`, except for the ones in `missing`.
struct FileNameResolver {
    missing: Vec<&'static str>,
}

impl ArtifactResolver for FileNameResolver {
    type Artifact = String;

    fn resolve(&mut self, identity: &str, suffix: &str) -> Result<String, ResourceNotFoundError> {
        if self.missing.contains(&identity) {
            Err(ResourceNotFoundError::new(identity, suffix))
        } else {
            Ok(format!("{identity}{suffix}"))
        }
    }

    fn placeholder(&mut self, identity: &str) -> String {
        format!("?{identity}")
    }
}

#[derive(Default)]
struct MapSink {
    values: BTreeMap<String, BTreeMap<&'static str, f64>>,
    details: BTreeMap<String, String>,
}

impl MetricSink<String> for MapSink {
    fn record(&mut self, artifact: &String, metric: Metric, value: f64) {
        assert!(!value.is_nan(), "NaN recorded for {artifact} {metric}");
        self.values
            .entry(artifact.clone())
            .or_default()
            .insert(metric.key(), value);
    }

    fn record_details(&mut self, artifact: &String, details: &str) {
        self.details.insert(artifact.clone(), details.to_owned());
    }
}

#[test]
fn primary_reports_with_nested_classes() -> Result<()> {
    let config = CollectorConfig::default();
    let outcome = Collector::new(&config).collect_dir(&fixture_dir("primary"))?;

    // TESTS-ignored.xml is not read because TEST-*.xml reports exist.
    assert_eq!(outcome.parsed_reports, 2);
    assert_eq!(
        outcome.index.class_identities().collect::<Vec<_>>(),
        vec!["UnitTests"]
    );

    let report = outcome.index.report_for("UnitTests").unwrap();
    assert_eq!(
        report.totals(),
        OutcomeDelta {
            tests: 7,
            skipped: 1,
            errors: 1,
            failures: 1,
            duration: Duration::from_millis(521),
        }
    );

    let names: Vec<_> = report
        .results()
        .iter()
        .map(|result| (result.name.as_str(), result.status))
        .collect();
    assert_eq!(
        names,
        vec![
            ("TestAdd", TestStatus::Passed),
            ("TestSubtract", TestStatus::Passed),
            ("TestMultiply", TestStatus::Failure),
            ("TestDivide", TestStatus::Skipped),
            ("TestNegate", TestStatus::Passed),
            ("Parser/TestEmpty", TestStatus::Passed),
            ("Parser/TestNested", TestStatus::Error),
        ]
    );

    let multiply = &report.results()[2];
    assert_eq!(multiply.message.as_deref(), Some("expected: 6, actual: 5"));
    assert_eq!(
        multiply.stack_trace.as_deref(),
        Some("at UnitTests.TestMultiply\n  at TestFramework.Run")
    );

    Ok(())
}

#[test]
fn publish_primary_reports() -> Result<()> {
    let mut config = CollectorConfig::default();
    config.metrics.publish_details = true;
    let outcome = Collector::new(&config).collect_dir(&fixture_dir("primary"))?;

    let mut sink = MapSink::default();
    let summary = MetricPublisher::new(&config.metrics, &config.classes.source_suffix).publish(
        &outcome.index,
        &mut FileNameResolver {
            missing: Vec::new(),
        },
        &mut sink,
    )?;

    assert_eq!(
        summary,
        PublishSummary {
            published: 1,
            skipped_empty: 0,
            unresolved: Vec::new(),
        }
    );
    let values = &sink.values["UnitTests.pas"];
    assert_eq!(
        values.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(),
        vec![
            ("skipped_tests", 1.0),
            ("test_errors", 1.0),
            ("test_execution_time", 521.0),
            ("test_failures", 1.0),
            ("test_success_density", 66.7),
            ("tests", 6.0),
        ]
    );

    let details = &sink.details["UnitTests.pas"];
    assert!(details.starts_with("<tests-details><testcase status=\"ok\" time=\"100\" name=\"TestAdd\"/>"));
    assert!(details.contains(
        "<testcase status=\"error\" time=\"9\" name=\"Parser/TestNested\" \
         message=\"access violation &amp; more\">at Parser.Parse</testcase>"
    ));
    assert!(details.ends_with("</tests-details>"));

    Ok(())
}

#[test]
fn aggregated_reports_fallback() -> Result<()> {
    let config = CollectorConfig::default();
    let outcome = Collector::new(&config).collect_dir(&fixture_dir("aggregated"))?;

    assert_eq!(outcome.parsed_reports, 1);
    assert_eq!(
        outcome.index.class_identities().collect::<Vec<_>>(),
        vec!["Lists", "Strings"]
    );

    let strings = outcome.index.report_for("Strings").unwrap();
    assert_eq!(
        strings.totals(),
        OutcomeDelta {
            tests: 3,
            skipped: 0,
            errors: 0,
            failures: 1,
            duration: Duration::from_millis(1_000_760),
        }
    );
    let names: Vec<_> = strings.results().iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["TestTrim", "TestSplit", "Unicode/TestUpper"]);

    let mut sink = MapSink::default();
    let summary = MetricPublisher::new(&config.metrics, &config.classes.source_suffix).publish(
        &outcome.index,
        &mut FileNameResolver {
            missing: vec!["Lists"],
        },
        &mut sink,
    )?;

    assert_eq!(summary.unresolved, vec!["Lists".to_owned()]);
    // Everything in Lists was skipped, so there's no success density.
    let lists = &sink.values["?Lists"];
    assert_eq!(lists.get("tests"), Some(&0.0));
    assert_eq!(lists.get("skipped_tests"), Some(&1.0));
    assert_eq!(lists.get("test_success_density"), None);
    assert_eq!(
        sink.values["Strings.pas"].get("test_success_density"),
        Some(&66.7)
    );

    Ok(())
}

#[test]
fn malformed_report_aborts() {
    let config = CollectorConfig::default();
    let err = Collector::new(&config)
        .collect_dir(&fixture_dir("malformed"))
        .unwrap_err();

    assert_eq!(err.parsed_reports(), 1);
    match err.report_error() {
        ReportParseError::Malformed(error) => {
            assert_eq!(error.path().file_name(), Some("TEST-Truncated.xml"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_report_skipped() -> Result<()> {
    let mut config = CollectorConfig::default();
    config.reports.on_malformed = MalformedReportPolicy::Skip;
    let outcome = Collector::new(&config).collect_dir(&fixture_dir("malformed"))?;

    assert_eq!(outcome.parsed_reports, 1);
    assert_eq!(outcome.skipped_reports.len(), 1);
    assert_eq!(
        outcome.skipped_reports[0].path.file_name(),
        Some("TEST-Truncated.xml")
    );
    assert_eq!(
        outcome.index.class_identities().collect::<Vec<_>>(),
        vec!["Good"]
    );

    Ok(())
}

#[test]
fn truncated_distinguishable_from_empty() -> Result<()> {
    let empty = fixture_dir("empty").join("TEST-Empty.xml");
    let events = ReportStreamParser::from_path(&empty)?.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(
        events,
        vec![
            ReportEvent::SuiteStarted {
                name: Some("Empty".to_owned()),
            },
            ReportEvent::SuiteFinished,
        ]
    );

    let truncated = fixture_dir("malformed").join("TEST-Truncated.xml");
    let mut test_cases = 0;
    let mut failed = false;
    for event in ReportStreamParser::from_path(&truncated)? {
        match event {
            Ok(ReportEvent::TestCase(_)) => test_cases += 1,
            Ok(_) => {}
            Err(_) => failed = true,
        }
    }
    if !failed {
        bail!("truncated report parsed without errors");
    }
    assert_eq!(test_cases, 1);

    let config = CollectorConfig::default();
    let outcome = Collector::new(&config).collect_dir(&fixture_dir("empty"))?;
    assert_eq!(outcome.parsed_reports, 1);
    assert!(outcome.index.is_empty());

    Ok(())
}
