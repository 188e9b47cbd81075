// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metrics derived from a [`ClassReport`].

use crate::report::ClassReport;
use std::fmt;

/// The default number of decimals the success density is rounded to.
pub const DEFAULT_DENSITY_PRECISION: u32 = 1;

/// The largest supported number of decimals for the success density.
pub const MAX_DENSITY_PRECISION: u32 = 6;

/// A numeric metric published for each class.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Metric {
    /// The number of skipped tests.
    SkippedTests,

    /// The number of tests that were executed, i.e. not skipped.
    Tests,

    /// The number of tests that errored.
    TestErrors,

    /// The number of tests that failed.
    TestFailures,

    /// The cumulative execution time in milliseconds.
    TestExecutionTime,

    /// The percentage of executed tests that passed.
    TestSuccessDensity,
}

impl Metric {
    /// All metrics, in publishing order.
    pub const ALL: [Metric; 6] = [
        Metric::SkippedTests,
        Metric::Tests,
        Metric::TestErrors,
        Metric::TestFailures,
        Metric::TestExecutionTime,
        Metric::TestSuccessDensity,
    ];

    /// Returns the key this metric is published under.
    pub fn key(self) -> &'static str {
        match self {
            Metric::SkippedTests => "skipped_tests",
            Metric::Tests => "tests",
            Metric::TestErrors => "test_errors",
            Metric::TestFailures => "test_failures",
            Metric::TestExecutionTime => "test_execution_time",
            Metric::TestSuccessDensity => "test_success_density",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// The metrics computed for a single class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClassMetrics {
    /// The number of skipped tests.
    pub skipped: f64,

    /// The number of executed tests: all tests minus skipped ones.
    pub executed: f64,

    /// The number of tests that errored.
    pub errors: f64,

    /// The number of tests that failed.
    pub failures: f64,

    /// The cumulative execution time in milliseconds.
    pub execution_time_ms: f64,

    /// The percentage of executed tests that passed.
    ///
    /// NaN if no tests were executed.
    pub success_density: f64,
}

impl ClassMetrics {
    /// Computes metrics for `report`, rounding the success density to `density_precision`
    /// decimals.
    ///
    /// Returns `None` if the report has no tests at all: such classes are not published.
    pub fn compute(report: &ClassReport, density_precision: u32) -> Option<Self> {
        if report.tests() == 0 {
            return None;
        }

        let executed = report.tests() as f64 - report.skipped() as f64;
        let passed = executed - report.errors() as f64 - report.failures() as f64;
        let success_density = if executed > 0.0 {
            scale(passed * 100.0 / executed, density_precision)
        } else {
            f64::NAN
        };

        Some(Self {
            skipped: report.skipped() as f64,
            executed,
            errors: report.errors() as f64,
            failures: report.failures() as f64,
            execution_time_ms: report.duration().as_millis() as f64,
            success_density,
        })
    }

    /// Returns the value for `metric`.
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::SkippedTests => self.skipped,
            Metric::Tests => self.executed,
            Metric::TestErrors => self.errors,
            Metric::TestFailures => self.failures,
            Metric::TestExecutionTime => self.execution_time_ms,
            Metric::TestSuccessDensity => self.success_density,
        }
    }

    /// Iterates over the metrics that have a value, in publishing order.
    ///
    /// Metrics that are not applicable (NaN) are skipped.
    pub fn measures(&self) -> impl Iterator<Item = (Metric, f64)> + '_ {
        Metric::ALL
            .into_iter()
            .map(|metric| (metric, self.get(metric)))
            .filter(|(_, value)| !value.is_nan())
    }
}

/// Rounds `value` half away from zero to `precision` decimals.
fn scale(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision.min(MAX_DENSITY_PRECISION) as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{index::TestIndex, report::OutcomeDelta};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use test_case::test_case;

    fn report(tests: usize, skipped: usize, errors: usize, failures: usize) -> ClassReport {
        let mut index = TestIndex::new();
        index.record(
            "Foo",
            OutcomeDelta {
                tests,
                skipped,
                errors,
                failures,
                duration: Duration::from_millis(1234),
            },
        );
        index.report_for("Foo").unwrap().clone()
    }

    #[test]
    fn zero_tests_not_published() {
        assert_eq!(ClassMetrics::compute(&report(0, 0, 0, 0), 1), None);
    }

    #[test]
    fn mixed_outcomes() {
        let metrics = ClassMetrics::compute(&report(5, 1, 0, 1), 1).unwrap();
        assert_eq!(
            metrics.measures().collect::<Vec<_>>(),
            vec![
                (Metric::SkippedTests, 1.0),
                (Metric::Tests, 4.0),
                (Metric::TestErrors, 0.0),
                (Metric::TestFailures, 1.0),
                (Metric::TestExecutionTime, 1234.0),
                (Metric::TestSuccessDensity, 75.0),
            ]
        );
    }

    #[test]
    fn all_skipped_suppresses_density() {
        let metrics = ClassMetrics::compute(&report(2, 2, 0, 0), 1).unwrap();
        assert!(metrics.success_density.is_nan());
        assert_eq!(
            metrics.measures().collect::<Vec<_>>(),
            vec![
                (Metric::SkippedTests, 2.0),
                (Metric::Tests, 0.0),
                (Metric::TestErrors, 0.0),
                (Metric::TestFailures, 0.0),
                (Metric::TestExecutionTime, 1234.0),
            ]
        );
    }

    #[test]
    fn more_skipped_than_tests() {
        let metrics = ClassMetrics::compute(&report(1, 3, 0, 0), 1).unwrap();
        assert_eq!(metrics.executed, -2.0);
        assert!(metrics.success_density.is_nan());
    }

    #[test_case(3, 0, 0, 1, 1, 66.7 ; "one decimal")]
    #[test_case(3, 0, 0, 1, 2, 66.67 ; "two decimals")]
    #[test_case(3, 0, 0, 1, 0, 67.0 ; "no decimals")]
    #[test_case(8, 0, 1, 0, 1, 87.5 ; "exact")]
    #[test_case(4, 0, 2, 2, 1, 0.0 ; "nothing passed")]
    fn success_density(
        tests: usize,
        skipped: usize,
        errors: usize,
        failures: usize,
        precision: u32,
        expected: f64,
    ) {
        let metrics =
            ClassMetrics::compute(&report(tests, skipped, errors, failures), precision).unwrap();
        assert_eq!(metrics.success_density, expected);
    }
}
